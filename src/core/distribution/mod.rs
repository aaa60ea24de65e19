pub mod piping;
pub mod pump;
