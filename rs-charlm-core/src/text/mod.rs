//! Text side of the pipeline: where characters come from and how they
//! become numbers.

/// Concatenated training text and random window selection.
pub mod corpus;

/// Sorted character set with its label bijection.
pub mod vocabulary;

/// One-hot window encoding and training-set windowing.
pub mod encoding;
