pub mod openweather;
pub mod preferences;
pub mod usecases;
pub mod weather;
