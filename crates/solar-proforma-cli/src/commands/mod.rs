pub mod proforma;
pub mod sensitivity;
