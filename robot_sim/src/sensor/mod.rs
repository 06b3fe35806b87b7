pub mod camera;
pub mod filter;
pub mod imu;
pub mod wrench;
