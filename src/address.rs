use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A saved shipping address. At most one entry per user carries
/// `is_default = true`; `upsert` maintains that invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Raw address payload as clients send it; every field may be absent.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ShippingAddressInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub notes: Option<String>,
}

fn clean(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

pub fn normalize(input: &ShippingAddressInput) -> ShippingAddress {
    ShippingAddress {
        full_name: clean(input.full_name.as_deref()),
        phone: clean(input.phone.as_deref()),
        city: clean(input.city.as_deref()),
        street: clean(input.street.as_deref()),
        notes: clean(input.notes.as_deref()),
        is_default: false,
    }
}

/// Notes are optional; everything else must survive trimming.
pub fn is_complete(address: &ShippingAddress) -> bool {
    !address.full_name.is_empty()
        && !address.phone.is_empty()
        && !address.city.is_empty()
        && !address.street.is_empty()
}

/// Deduplication key: lowercased, whitespace-collapsed identity fields.
/// Notes never participate.
pub fn identity(address: &ShippingAddress) -> String {
    [
        &address.full_name,
        &address.phone,
        &address.city,
        &address.street,
    ]
    .map(|field| {
        field
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
    .join("|")
}

/// Upsert `address` into a user's address book.
///
/// Matches against the existing entries' identities and overwrites the matched
/// entry's fields in place, otherwise appends. The touched entry becomes the
/// default when explicitly requested, when no entry currently is, or when the
/// list ends up with a single entry; every other entry's flag is cleared in the
/// same pass. Returns false (list untouched) for incomplete addresses.
pub fn upsert(list: &mut Vec<ShippingAddress>, address: &ShippingAddress, set_default: bool) -> bool {
    if !is_complete(address) {
        return false;
    }

    let key = identity(address);
    let selected = match list.iter().position(|entry| identity(entry) == key) {
        Some(index) => {
            let entry = &mut list[index];
            entry.full_name = address.full_name.clone();
            entry.phone = address.phone.clone();
            entry.city = address.city.clone();
            entry.street = address.street.clone();
            entry.notes = address.notes.clone();
            index
        }
        None => {
            list.push(ShippingAddress {
                is_default: false,
                ..address.clone()
            });
            list.len() - 1
        }
    };

    let has_default = list.iter().any(|entry| entry.is_default);
    if set_default || !has_default || list.len() == 1 {
        for (index, entry) in list.iter_mut().enumerate() {
            entry.is_default = index == selected;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(full_name: &str, phone: &str, city: &str, street: &str) -> ShippingAddressInput {
        ShippingAddressInput {
            full_name: Some(full_name.to_string()),
            phone: Some(phone.to_string()),
            city: Some(city.to_string()),
            street: Some(street.to_string()),
            notes: None,
        }
    }

    #[test]
    fn normalize_trims_and_fills_missing_fields() {
        let raw = ShippingAddressInput {
            full_name: Some("  Mona Adel  ".to_string()),
            phone: Some("+201234567890".to_string()),
            city: None,
            street: Some(" 5 Tahrir Sq ".to_string()),
            notes: None,
        };
        let address = normalize(&raw);
        assert_eq!(address.full_name, "Mona Adel");
        assert_eq!(address.city, "");
        assert_eq!(address.street, "5 Tahrir Sq");
        assert!(!is_complete(&address));
    }

    #[test]
    fn identity_ignores_case_whitespace_and_notes() {
        let mut a = normalize(&input("Mona  Adel", "+201234567890", "Cairo", "5 Tahrir Sq"));
        let b = normalize(&input("mona adel", "+201234567890", "CAIRO", " 5  tahrir sq "));
        a.notes = "leave at door".to_string();
        assert_eq!(identity(&a), identity(&b));
    }

    #[test]
    fn upsert_deduplicates_case_and_whitespace_variants() {
        let mut list = Vec::new();
        let first = normalize(&input("Mona Adel", "+201234567890", "Cairo", "5 Tahrir Sq"));
        let variant = normalize(&input("MONA  ADEL", "+201234567890", "cairo", "5 tahrir sq"));

        assert!(upsert(&mut list, &first, false));
        assert!(upsert(&mut list, &variant, false));

        assert_eq!(list.len(), 1);
        // Match-then-overwrite: the stored fields are the newest ones.
        assert_eq!(list[0].full_name, "MONA  ADEL");
    }

    #[test]
    fn first_address_becomes_default() {
        let mut list = Vec::new();
        let address = normalize(&input("Mona Adel", "+201234567890", "Cairo", "5 Tahrir Sq"));
        upsert(&mut list, &address, false);

        assert_eq!(list.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn set_default_clears_other_entries() {
        let mut list = Vec::new();
        let home = normalize(&input("Mona Adel", "+201234567890", "Cairo", "5 Tahrir Sq"));
        let office = normalize(&input("Mona Adel", "+201234567890", "Giza", "12 Dokki St"));

        upsert(&mut list, &home, false);
        upsert(&mut list, &office, true);

        assert_eq!(list.len(), 2);
        assert!(!list[0].is_default);
        assert!(list[1].is_default);
        assert_eq!(list.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn existing_default_is_kept_without_request() {
        let mut list = Vec::new();
        let home = normalize(&input("Mona Adel", "+201234567890", "Cairo", "5 Tahrir Sq"));
        let office = normalize(&input("Mona Adel", "+201234567890", "Giza", "12 Dokki St"));

        upsert(&mut list, &home, false);
        upsert(&mut list, &office, false);

        assert!(list[0].is_default);
        assert!(!list[1].is_default);
    }

    #[test]
    fn incomplete_address_is_rejected() {
        let mut list = Vec::new();
        let missing_city = normalize(&ShippingAddressInput {
            full_name: Some("Mona Adel".to_string()),
            phone: Some("+201234567890".to_string()),
            city: Some("   ".to_string()),
            street: Some("5 Tahrir Sq".to_string()),
            notes: None,
        });
        assert!(!upsert(&mut list, &missing_city, true));
        assert!(list.is_empty());
    }
}
