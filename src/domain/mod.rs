pub mod issue;
pub mod link;
