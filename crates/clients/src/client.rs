use serde::{Deserialize, Serialize};

use banks_core::{BankError, BankResult, NameCharset, validate_name};

use crate::address::Address;

/// Passport identifier: exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PassportId(String);

impl PassportId {
    pub fn parse(value: impl Into<String>) -> BankResult<Self> {
        let value = value.into();
        if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(BankError::validation(format!(
                "passport id must be a 10-digit string (got '{value}')"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PassportId {
    type Error = BankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PassportId> for String {
    fn from(value: PassportId) -> Self {
        value.0
    }
}

impl core::fmt::Display for PassportId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bank client.
///
/// Identity is assigned by the bank on registration; the client itself only
/// carries personal data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    name: String,
    lastname: String,
    address: Option<Address>,
    passport: Option<PassportId>,
}

impl Client {
    pub fn new(
        name: &str,
        lastname: &str,
        address: Option<Address>,
        passport: Option<PassportId>,
    ) -> BankResult<Self> {
        Ok(Self {
            name: validate_name(name, "client name", NameCharset::Alphabetic)?,
            lastname: validate_name(lastname, "client lastname", NameCharset::Alphabetic)?,
            address,
            passport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.lastname)
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn passport(&self) -> Option<&PassportId> {
        self.passport.as_ref()
    }

    /// Verified iff both a passport and an address are on file.
    ///
    /// Derived on every call; never cached.
    pub fn is_verified(&self) -> bool {
        self.passport.is_some() && self.address.is_some()
    }

    pub fn set_name(&mut self, name: &str) -> BankResult<()> {
        self.name = validate_name(name, "client name", NameCharset::Alphabetic)?;
        Ok(())
    }

    pub fn set_lastname(&mut self, lastname: &str) -> BankResult<()> {
        self.lastname = validate_name(lastname, "client lastname", NameCharset::Alphabetic)?;
        Ok(())
    }

    pub fn set_address(&mut self, address: Option<Address>) {
        self.address = address;
    }

    pub fn set_passport(&mut self, passport: Option<PassportId>) {
        self.passport = passport;
    }
}

/// Fluent construction of a [`Client`]. Name and lastname are mandatory.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    name: Option<String>,
    lastname: Option<String>,
    address: Option<Address>,
    passport: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn lastname(mut self, lastname: impl Into<String>) -> Self {
        self.lastname = Some(lastname.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn passport(mut self, passport: impl Into<String>) -> Self {
        self.passport = Some(passport.into());
        self
    }

    pub fn build(self) -> BankResult<Client> {
        let name = self
            .name
            .ok_or_else(|| BankError::validation("client must have a name"))?;
        let lastname = self
            .lastname
            .ok_or_else(|| BankError::validation("client must have a lastname"))?;
        let passport = self.passport.map(PassportId::parse).transpose()?;

        Client::new(&name, &lastname, self.address, passport)
    }
}
