//! Pricing Handlers

use jiff::civil::Date;
use salvo::prelude::StatusError;

pub(crate) mod compare;
pub(crate) mod forecast;
pub(crate) mod suggest;

fn parse_date(value: &str, name: &str) -> Result<Date, StatusError> {
    value.parse::<Date>().map_err(|_error| {
        StatusError::bad_request().brief(format!("could not parse \"{name}\" as a date"))
    })
}
