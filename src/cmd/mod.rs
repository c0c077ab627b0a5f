pub mod rates;
pub mod simulate;
pub mod validate;
