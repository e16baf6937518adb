pub mod camera;
pub mod error;
pub mod thermocouple;
pub mod transform;

pub use camera::{CameraDriver, DummyCameraDriver, FileImporterDriver, Frame, HawkeyeCameraDriver};
pub use error::DriverError;
pub use thermocouple::{DummyThermocoupleDriver, ThermocoupleDriver, W1ThermocoupleDriver};
pub use transform::apply_transform;
