//! Donation pledges.  No payment is taken; the record is the receipt.

use chrono::Utc;
use rusqlite::params;
use slab_shared::community::{Donation, DonationCause, DonationForm};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    pub fn record_donation(&self, form: &DonationForm) -> Result<Donation> {
        form.validate()?;
        let character = match form.cause {
            DonationCause::Character => form.character.as_deref().map(str::trim).map(String::from),
            _ => None,
        };
        let created_at = Utc::now().to_rfc3339();
        let amount_cents = form.amount_cents();

        self.conn().execute(
            "INSERT INTO donations
                (cause, character, amount_cents, donor_name, donor_email, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.cause.as_str(),
                character,
                amount_cents,
                form.donor_name.trim(),
                form.donor_email.trim(),
                form.message.trim(),
                created_at,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        tracing::info!(donation_id = id, cause = form.cause.as_str(), amount_cents, "donation recorded");

        Ok(Donation {
            id,
            cause: form.cause,
            character,
            amount_cents,
            donor_name: form.donor_name.trim().to_string(),
            donor_email: form.donor_email.trim().to_string(),
            message: form.message.trim().to_string(),
            created_at,
        })
    }

    pub fn list_donations(&self) -> Result<Vec<Donation>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, cause, character, amount_cents, donor_name, donor_email, message, created_at
             FROM donations ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let cause: String = row.get(1)?;
            let cause = cause.parse::<DonationCause>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
            })?;
            Ok(Donation {
                id: row.get(0)?,
                cause,
                character: row.get(2)?,
                amount_cents: row.get(3)?,
                donor_name: row.get(4)?,
                donor_email: row.get(5)?,
                message: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donation_is_stored_with_cents() {
        let db = Database::open_in_memory().unwrap();
        let donation = db
            .record_donation(&DonationForm {
                cause: DonationCause::Character,
                character: Some(" builder-bob ".into()),
                amount: 12.5,
                donor_name: "Ann".into(),
                donor_email: "ann@slab.city".into(),
                message: "For the camp".into(),
            })
            .unwrap();
        assert_eq!(donation.amount_cents, 1250);
        assert_eq!(donation.character.as_deref(), Some("builder-bob"));
        assert_eq!(db.list_donations().unwrap(), vec![donation]);
    }

    #[test]
    fn character_is_dropped_for_other_causes() {
        let db = Database::open_in_memory().unwrap();
        let donation = db
            .record_donation(&DonationForm {
                cause: DonationCause::Locations,
                character: Some("nomad-nick".into()),
                amount: 5.0,
                donor_name: "Tim".into(),
                donor_email: "tim@slab.city".into(),
                message: String::new(),
            })
            .unwrap();
        assert_eq!(donation.character, None);
    }
}
