pub mod folios;
pub mod libreta;
pub mod saldo;
