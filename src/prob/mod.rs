mod categorical;

pub use categorical::Categorical;
