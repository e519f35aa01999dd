//! MS-DTYP security structures: SIDs, ACEs, ACLs and security descriptors.

pub mod ace;
pub mod acl;
pub mod diagnostics;
pub mod security_descriptor;
pub mod sid;

pub use ace::*;
pub use acl::*;
pub use diagnostics::*;
pub use security_descriptor::*;
pub use sid::*;
