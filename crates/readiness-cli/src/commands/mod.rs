pub mod answer;
pub mod consult;
pub mod init;
pub mod navigate;
pub mod reset;
pub mod results;
pub mod resume;
pub mod save;
pub mod start;
pub mod status;
pub mod validate;
