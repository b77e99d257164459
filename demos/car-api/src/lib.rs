//! Car catalogue example for the Gantry gateway
//!
//! Two routes over a fixed, in-memory dataset:
//! - `/car`: list cars with price and brand filters, or "create" one
//! - `/car/{id}`: get a specific car

pub mod transport;

use gantry_core::{ApiError, BoxError, SchemaBuilder, Serializable, Value};
use gantry_gateway::{
    Arguments, HandlerResult, Route, RouteBuilder, RouteDefinitionError, RouteRegistry, Signature,
};
use std::sync::OnceLock;

/// A car of the catalogue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Car {
    pub id: i64,
    pub brand: String,
    pub price: f64,
}

impl Car {
    pub fn new(id: i64, brand: &str, price: f64) -> Self {
        Self {
            id,
            brand: brand.to_string(),
            price,
        }
    }
}

impl Serializable for Car {
    const NAME: &'static str = "Car";

    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .attribute("id", |car| &car.id, |car| &mut car.id)
            .attribute("brand", |car| &car.brand, |car| &mut car.brand)
            .attribute("price", |car| &car.price, |car| &mut car.price);
    }
}

/// Result envelope of the car listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarList {
    pub result: Vec<Car>,
}

impl Serializable for CarList {
    const NAME: &'static str = "CarList";

    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema.attribute("result", |list| &list.result, |list| &mut list.result);
    }
}

/// The catalogue. There is no dynamic update of the dataset.
pub fn dataset() -> &'static [Car] {
    static CARS: OnceLock<Vec<Car>> = OnceLock::new();
    CARS.get_or_init(|| {
        vec![
            Car::new(1, "Ford", 45000.0),
            Car::new(2, "Toyota", 35000.0),
            Car::new(3, "Chevrolet", 20000.0),
        ]
    })
}

/// `/car`
pub struct CarRoute;

impl CarRoute {
    fn list(&self, args: &mut Arguments) -> HandlerResult<CarList> {
        let min_price: i64 = args.take("minPrice")?;
        let max_price: Option<i64> = args.take("maxPrice")?;
        let brand: Option<String> = args.take("brand")?;

        let result = dataset()
            .iter()
            .filter(|car| car.price >= min_price as f64)
            .filter(|car| max_price.map_or(true, |max| car.price <= max as f64))
            .filter(|car| brand.as_ref().map_or(true, |brand| &car.brand == brand))
            .cloned()
            .collect();

        Ok(CarList { result })
    }

    // Do not really create the car.
    fn create(&self, args: &mut Arguments) -> HandlerResult<Car> {
        Ok(args.take("car")?)
    }
}

impl Route for CarRoute {
    const PATH: &'static str = "/car";

    fn declare(route: &mut RouteBuilder<Self>) {
        route
            .get(
                Signature::new()
                    .doc(
                        "List all the cars.

                        * `minPrice` - The minimal price of the returned cars.
                        * `maxPrice` - The maximal price of the returned cars.
                        * `brand` - The brand name of the returned cars.",
                    )
                    .optional::<i64>("minPrice", 0)
                    .optional::<Option<i64>>("maxPrice", Value::Null)
                    .optional::<Option<String>>("brand", Value::Null),
                Self::list,
            )
            .put(
                Signature::new()
                    .doc(
                        "Create a car.

                        * `car` - The new car's data.",
                    )
                    .required::<Car>("car"),
                Self::create,
            );
    }

    fn from_path(_path: &mut Arguments) -> Result<Self, BoxError> {
        Ok(CarRoute)
    }
}

/// `/car/{id}`
pub struct CarInfoRoute {
    id: i64,
}

impl CarInfoRoute {
    fn get(&self, _args: &mut Arguments) -> HandlerResult<Car> {
        dataset()
            .iter()
            .find(|car| car.id == self.id)
            .cloned()
            .ok_or_else(|| ApiError::not_found().into())
    }
}

impl Route for CarInfoRoute {
    const PATH: &'static str = "/car/{id}";

    fn declare(route: &mut RouteBuilder<Self>) {
        route
            .doc("* `id` - The car identifier.")
            .path_parameter::<i64>("id")
            .get(Signature::new().doc("Get a specific car."), Self::get);
    }

    fn from_path(path: &mut Arguments) -> Result<Self, BoxError> {
        Ok(CarInfoRoute {
            id: path.take("id")?,
        })
    }
}

/// Registry of every car route
pub fn registry() -> Result<RouteRegistry, RouteDefinitionError> {
    RouteRegistry::builder()
        .route::<CarRoute>()
        .route::<CarInfoRoute>()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::{deserialize, serialize};
    use serde_json::json;

    #[test]
    fn test_car_serialization() {
        let car = Car::new(2, "Toyota", 35000.0);
        let value = serialize(&car).unwrap();
        assert_eq!(value, json!({"id": 2, "brand": "Toyota", "price": 35000.0}));

        let data = value.as_object().unwrap();
        assert_eq!(deserialize::<Car>(data).unwrap(), car);
    }

    #[test]
    fn test_list_serializes_envelope() {
        let list = CarList {
            result: vec![Car::new(3, "Chevrolet", 20000.0)],
        };
        assert_eq!(
            serialize(&list).unwrap(),
            json!({"result": [{"id": 3, "brand": "Chevrolet", "price": 20000.0}]})
        );
    }

    #[test]
    fn test_registry() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.versions().into_iter().collect::<Vec<_>>(), vec![1]);
    }
}
