pub mod home;
pub mod locations;

pub use home::HomeController;
pub use locations::LocationsController;
