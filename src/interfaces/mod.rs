pub mod csv;
pub mod intake;
