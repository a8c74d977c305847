pub mod run;
pub mod select;
pub mod sequence;
