use std::{fmt, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local};

/// Card data used by automatic checkout.
///
/// Loaded from a four line text file:
/// ```text
/// 1234-5678-9012-3456
/// 07/29
/// 12
/// 900101
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub card_number_groups: [String; 4],
    pub expiry_month: String,
    /// Two-digit year.
    pub expiry_year: String,
    /// First two digits of the card PIN.
    pub pin_prefix: String,
    /// First six digits of the owner's id number.
    pub owner_id_prefix: String,
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card", &format!("****-****-****-{}", self.card_number_groups[3]))
            .field("expiry", &format!("{}/{}", self.expiry_month, self.expiry_year))
            .finish_non_exhaustive()
    }
}

impl PaymentDetails {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read card file {}", path.display()))?;
        let details = Self::parse(&contents)
            .with_context(|| format!("malformed card file {}", path.display()))?;
        let this_year = (Local::now().year() % 100) as u32;
        details.validate(this_year)?;
        Ok(details)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().map(str::trim);
        let mut next_line = |field: &str| {
            lines
                .next()
                .filter(|line| !line.is_empty())
                .ok_or_else(|| anyhow!("missing {field} line"))
        };

        let numbers = next_line("card number")?;
        let expiry = next_line("expiry")?;
        let pin_prefix = next_line("pin")?.to_string();
        let owner_id_prefix = next_line("owner id")?.to_string();

        let groups: Vec<String> = numbers.split('-').map(|g| g.trim().to_string()).collect();
        let card_number_groups: [String; 4] = groups.try_into().map_err(|groups: Vec<String>| {
            anyhow!("card number should have 4 groups but has {}", groups.len())
        })?;

        let (expiry_month, expiry_year) = expiry
            .split_once('/')
            .map(|(month, year)| (month.trim().to_string(), year.trim().to_string()))
            .ok_or_else(|| anyhow!("expiry should look like MM/YY, got '{expiry}'"))?;

        Ok(Self {
            card_number_groups,
            expiry_month,
            expiry_year,
            pin_prefix,
            owner_id_prefix,
        })
    }

    /// Offline checks; `this_year` is the current two-digit year.
    pub fn validate(&self, this_year: u32) -> Result<()> {
        if let Some(group) = self.card_number_groups.iter().find(|g| !is_digits(g, None)) {
            bail!("card number group '{group}' is not numeric");
        }

        let month: u32 = self
            .expiry_month
            .parse()
            .map_err(|_| anyhow!("invalid expiry month {}", self.expiry_month))?;
        if !(1..=12).contains(&month) {
            bail!("invalid expiry month {}", self.expiry_month);
        }

        let year: u32 = self
            .expiry_year
            .parse()
            .map_err(|_| anyhow!("invalid expiry year {}", self.expiry_year))?;
        if !(this_year..=this_year + 12).contains(&year) {
            bail!("invalid expiry year {}", self.expiry_year);
        }

        if !is_digits(&self.pin_prefix, Some(2)) {
            bail!("pin prefix should be 2 digits");
        }
        if !is_digits(&self.owner_id_prefix, Some(6)) {
            bail!("owner id prefix should be 6 digits");
        }
        Ok(())
    }
}

fn is_digits(value: &str, len: Option<usize>) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_digit())
        && len.map_or(true, |len| value.len() == len)
}
