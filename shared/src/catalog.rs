//! Fixed product and location catalog used by the frontend pickers

/// Market locations where purchases are made
pub const MARKET_LOCATIONS: &[&str] = &[
    "Калинівський ринок",
    "Зелений ринок",
    "Метро",
    "Склад овочевий",
    "Склад сировини \"Трембіта\"",
    "Інше",
];

/// Stores and sites that receive unloadings
pub const UNLOADING_LOCATIONS: &[&str] = &[
    "Героїв Майдану",
    "Ентузіастів",
    "Бульвар",
    "Гравітон",
    "Садова",
    "Флоріда",
    "Ентузіастів 2 поверх",
    "Піцерія",
    "Руська",
    "Склад овочевий",
    "Склад сировини \"Трембіта\"",
    "Склад№2",
    "Інше",
];

/// Deliveries go to the same places as unloadings
pub const DELIVERY_LOCATIONS: &[&str] = UNLOADING_LOCATIONS;

/// Location name meaning "type it in by hand"
pub const CUSTOM_LOCATION: &str = "Інше";

/// Location that receipt-scanned purchases are filed under
pub const RECEIPT_LOCATION: &str = "Метро";

pub const PRODUCTS: &[&str] = &[
    "Картопля",
    "Цибуля",
    "Цибуля синя",
    "Капуста",
    "Морква",
    "Буряк",
    "Гриби",
    "Помідори",
    "Банан",
    "Часник",
    "Перець",
    "Кабачки",
    "Баклажан",
    "Лимон",
    "Майонез євро 0,520 грам",
    "Майонез щедро провансаль 0,550 грам",
    "Майонез столичний 0,550 грам",
    "Гарам",
    "Сухарі",
    "Крекер з цибулею 0,180 грам",
    "Гірчиця американська 0,130 грам",
    "Сирки ферма",
    "Згущене молоко",
    "Мак",
    "Томатна паста",
    "Кава",
    "Вершки",
    "Висівки",
    "Мед",
    "Дріжджі сухі 0,042 грам",
    "Дріжджі 0,1 грам",
    "Хмелі сунелі",
    "Оливки",
    "Кукурудза",
    "Печево топлене молоко",
    "Печево Марія",
    "Горгонзола сир",
    "Лавровий лист",
    "Суха гірчиця",
    "Паприка копчена",
    "Лимонний сік",
    "Капустка квашена",
];

/// Products whose unloading source is picked by the operator instead of
/// being checked against today's purchases
pub const WAREHOUSE_PRODUCTS: &[&str] = &["Картопля", "Капуста", "Капустка квашена"];

/// Physical warehouses a warehouse product can be unloaded from
pub const WAREHOUSE_SOURCES: &[&str] = &["Склад овочевий", "Склад сировини \"Трембіта\"", "Склад№2"];

pub fn is_warehouse_product(product_name: &str) -> bool {
    WAREHOUSE_PRODUCTS.contains(&product_name)
}

pub fn is_warehouse_source(name: &str) -> bool {
    WAREHOUSE_SOURCES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warehouse_products_are_catalog_products() {
        for product in WAREHOUSE_PRODUCTS {
            assert!(PRODUCTS.contains(product), "{product} missing from catalog");
        }
    }

    #[test]
    fn test_warehouse_sources_are_unloading_locations() {
        for source in WAREHOUSE_SOURCES {
            assert!(UNLOADING_LOCATIONS.contains(source));
        }
        assert!(is_warehouse_source("Склад№2"));
        assert!(!is_warehouse_source("Метро"));
    }

    #[test]
    fn test_is_warehouse_product() {
        assert!(is_warehouse_product("Картопля"));
        assert!(!is_warehouse_product("Морква"));
    }
}
