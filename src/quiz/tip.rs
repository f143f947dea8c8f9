use std::str::FromStr;

use log::info;
use teloxide::prelude::*;
use teloxide::types::LabeledPrice;

use crate::error::{QuizError, QuizResult};
use crate::quiz::content::Strings;

pub const MIN_TIP: u32 = 1;
pub const MAX_TIP: u32 = 100;
pub const TIP_CURRENCY: &str = "USD";

/// Whole-dollar tip, always within `MIN_TIP..=MAX_TIP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipAmount(u32);

impl TipAmount {
    pub fn new(dollars: u32) -> QuizResult<Self> {
        if (MIN_TIP..=MAX_TIP).contains(&dollars) {
            Ok(Self(dollars))
        } else {
            Err(QuizError::InvalidTip(format!(
                "{} is outside {}..={}",
                dollars, MIN_TIP, MAX_TIP
            )))
        }
    }

    pub fn dollars(&self) -> u32 {
        self.0
    }

    /// Amount in cents, as payment providers expect.
    pub fn minor_units(&self) -> u32 {
        self.0 * 100
    }
}

impl FromStr for TipAmount {
    type Err = QuizError;

    fn from_str(s: &str) -> QuizResult<Self> {
        let digits = s.trim().trim_start_matches('$').trim();
        let dollars = digits
            .parse::<u32>()
            .map_err(|_| QuizError::InvalidTip(format!("'{}' is not a whole number", s.trim())))?;
        Self::new(dollars)
    }
}

/// Create a hosted checkout link for the tip. Validation happens before this
/// point, so no request is made for an invalid amount.
pub async fn create_tip_link(
    bot: &Bot,
    provider_token: &str,
    strings: &Strings,
    amount: TipAmount,
) -> QuizResult<String> {
    let cents = amount
        .minor_units()
        .try_into()
        .map_err(|_| QuizError::InvalidTip(format!("{} cents overflows", amount.minor_units())))?;
    let prices = vec![LabeledPrice::new(strings.tip_title.clone(), cents)];

    let link = bot
        .create_invoice_link(
            strings.tip_title.clone(),
            strings.tip_description.clone(),
            format!("tip-{}", amount.dollars()),
            provider_token.to_string(),
            TIP_CURRENCY,
            prices,
        )
        .await?;

    info!("Created tip link for ${}", amount.dollars());
    Ok(link)
}
