use crate::models::driver::Driver;
use crate::models::trip::Trip;

/// True when the driver's route passes through the trip's source,
/// destination and every intermediate stop. Order along the route is not
/// checked.
pub fn covers_route(driver: &Driver, trip: &Trip) -> bool {
    trip.required_stops().all(|stop| driver.serves(stop))
}

/// Intermediate stops of `trip` that the driver's route does not visit.
pub fn missing_waypoints<'t>(driver: &Driver, trip: &'t Trip) -> Vec<&'t str> {
    trip.intermediate_destinations
        .iter()
        .map(String::as_str)
        .filter(|stop| !driver.serves(stop))
        .collect()
}

pub fn has_capacity(driver: &Driver, trip: &Trip) -> bool {
    driver.remaining_capacity() >= trip.tonnage
}

pub fn already_carries(driver: &Driver, trip: &Trip) -> bool {
    driver.assigned_trips.contains(&trip.id)
}

pub fn is_eligible(driver: &Driver, trip: &Trip) -> bool {
    covers_route(driver, trip) && has_capacity(driver, trip) && !already_carries(driver, trip)
}

/// Drivers that could take `trip`, in the iteration order of `drivers`.
pub fn eligible_drivers<'a, I>(trip: &Trip, drivers: I) -> Vec<&'a Driver>
where
    I: IntoIterator<Item = &'a Driver>,
{
    drivers
        .into_iter()
        .filter(|driver| is_eligible(driver, trip))
        .collect()
}
