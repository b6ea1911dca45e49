pub mod breaker;
pub mod bus_api;
pub mod catalog;
pub mod in_flight;
pub mod seat_view;
