pub mod lexicon;
pub mod product;

pub use lexicon::Severity;
pub use product::{score_product, ProductRiskResult};
