use serde::{Deserialize, Serialize};

use banks_core::{BankError, BankResult, NameCharset, validate_name};

/// Postal address of a client (value object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    zip: String,
    country: String,
    city: String,
    street: String,
    street_number: u32,
    building: Option<String>,
}

impl Address {
    pub fn new(
        zip: impl Into<String>,
        country: impl Into<String>,
        city: impl Into<String>,
        street: impl Into<String>,
        street_number: u32,
        building: Option<String>,
    ) -> BankResult<Self> {
        let zip = zip.into();
        if zip.len() != 6 || !zip.chars().all(|c| c.is_ascii_digit()) {
            return Err(BankError::validation(format!(
                "zip must be a 6-digit string (got '{zip}')"
            )));
        }

        let country = validate_name(&country.into(), "country", NameCharset::Alphabetic)?;
        let city = validate_name(&city.into(), "city", NameCharset::Alphabetic)?;

        let street = street.into();
        if street.trim().is_empty() {
            return Err(BankError::validation("street must not be empty"));
        }

        if let Some(b) = &building {
            if b.is_empty() || !b.chars().all(char::is_alphanumeric) {
                return Err(BankError::validation(format!(
                    "building must be alphanumeric (got '{b}')"
                )));
            }
        }

        Ok(Self {
            zip,
            country,
            city,
            street,
            street_number,
            building,
        })
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn street_number(&self) -> u32 {
        self.street_number
    }

    pub fn building(&self) -> Option<&str> {
        self.building.as_deref()
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.zip, self.country, self.city, self.street, self.street_number
        )?;
        if let Some(b) = &self.building {
            write!(f, ", {b}")?;
        }
        Ok(())
    }
}

/// Step-by-step construction of an [`Address`]; validation runs in `build`.
#[derive(Debug, Clone, Default)]
pub struct AddressBuilder {
    zip: Option<String>,
    country: Option<String>,
    city: Option<String>,
    street: Option<String>,
    street_number: Option<u32>,
    building: Option<String>,
}

impl AddressBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn street_number(mut self, street_number: u32) -> Self {
        self.street_number = Some(street_number);
        self
    }

    pub fn building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    pub fn build(self) -> BankResult<Address> {
        let missing = |field: &str| BankError::validation(format!("address {field} is required"));

        Address::new(
            self.zip.ok_or_else(|| missing("zip"))?,
            self.country.ok_or_else(|| missing("country"))?,
            self.city.ok_or_else(|| missing("city"))?,
            self.street.ok_or_else(|| missing("street"))?,
            self.street_number.ok_or_else(|| missing("street number"))?,
            self.building,
        )
    }
}
