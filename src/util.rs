pub mod db;
pub mod iq;
