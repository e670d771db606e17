pub mod pago;
pub mod remision;
pub mod sesion;
pub mod usuario;

pub use pago::*;
pub use remision::*;
pub use sesion::*;
pub use usuario::*;
