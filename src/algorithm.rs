//! The Master Password derivation pipeline: MKD → SSD → TC.
//!
//! This is a wire-compatible cryptographic contract: every byte of
//! every input string and every length prefix is observable in the
//! output. See <https://masterpasswordapp.com/algorithm.html> for the
//! canonical description this crate implements.

use byteorder::{BigEndian, WriteBytesExt};
use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use scrypt::{scrypt, Params};
use sha2::Sha256;

use crate::catalog::{Catalog, PasswordType};
use crate::error::{DerivationError, DerivationErrorKind};
use crate::secret::{MasterKey, Secret, SiteSeed};

/// Domain-separation scope string shared by MKD and SSD. UTF-8, 25
/// bytes, no trailing NUL — the exact literal is part of the wire
/// contract.
const SCOPE: &str = "com.lyndir.masterpassword";

const MASTER_KEY_LEN: usize = 64;

lazy_static! {
    /// scrypt cost parameters fixed by the algorithm: N = 2^15, r = 8,
    /// p = 2, dkLen = 64.
    static ref SCRYPT_PARAMS: Params =
        Params::new(15, 8, 2, MASTER_KEY_LEN).expect("fixed scrypt parameters are always valid");
}

/// Which CLI-facing site type to derive. Maps onto a `PasswordType` via
/// [`SiteType::password_type`], which pins each tag to the
/// (class-name, type-name) pair used to index the template catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SiteType {
    GeneratedMaximum,
    GeneratedLong,
    GeneratedMedium,
    GeneratedBasic,
    GeneratedShort,
    GeneratedPIN,
    GeneratedName,
    GeneratedPhrase,
}

impl SiteType {
    /// Parse a `-t` tag, accepting the same short and long aliases as
    /// the original CLI.
    pub fn from_str(s: &str) -> Option<SiteType> {
        match s {
            "x" | "max" | "maximum" => Some(SiteType::GeneratedMaximum),
            "l" | "long" => Some(SiteType::GeneratedLong),
            "m" | "med" | "medium" => Some(SiteType::GeneratedMedium),
            "b" | "basic" => Some(SiteType::GeneratedBasic),
            "s" | "short" => Some(SiteType::GeneratedShort),
            "i" | "pin" => Some(SiteType::GeneratedPIN),
            "n" | "name" => Some(SiteType::GeneratedName),
            "p" | "phrase" => Some(SiteType::GeneratedPhrase),
            _ => None,
        }
    }

    pub fn password_type(&self) -> PasswordType {
        let name = match self {
            SiteType::GeneratedMaximum => "Maximum",
            SiteType::GeneratedLong => "Long",
            SiteType::GeneratedMedium => "Medium",
            SiteType::GeneratedBasic => "Basic",
            SiteType::GeneratedShort => "Short",
            SiteType::GeneratedPIN => "PIN",
            SiteType::GeneratedName => "Name",
            SiteType::GeneratedPhrase => "Phrase",
        };
        PasswordType::generated(name)
    }
}

impl Default for SiteType {
    /// "Long" is the CLI's default password type.
    fn default() -> Self {
        SiteType::GeneratedLong
    }
}

impl serde::Serialize for SiteType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            SiteType::GeneratedMaximum => "maximum",
            SiteType::GeneratedLong => "long",
            SiteType::GeneratedMedium => "medium",
            SiteType::GeneratedBasic => "basic",
            SiteType::GeneratedShort => "short",
            SiteType::GeneratedPIN => "pin",
            SiteType::GeneratedName => "name",
            SiteType::GeneratedPhrase => "phrase",
        })
    }
}

impl<'de> serde::Deserialize<'de> for SiteType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = SiteType;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(
                    formatter,
                    r#"one of "x", "max", "maximum", "l", "long", "m", "med", "medium", "b", "basic", "s", "short", "i", "pin", "n", "name", "p", "phrase""#
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<SiteType, E>
            where
                E: serde::de::Error,
            {
                SiteType::from_str(value)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

/// The validated input to a single derivation.
pub struct DerivationRequest {
    pub user_name: String,
    pub master_password: Secret<String>,
    pub site_name: String,
    pub site_counter: u32,
    pub site_type: SiteType,
}

impl DerivationRequest {
    /// Validate inputs at the request boundary: user name and site
    /// name must be non-empty, counter must be at least 1.
    pub fn new(
        user_name: String,
        master_password: Secret<String>,
        site_name: String,
        site_counter: u32,
        site_type: SiteType,
    ) -> Result<Self, DerivationError> {
        if user_name.is_empty() {
            return Err(DerivationError::new(
                DerivationErrorKind::MissingUser,
                "missing user name",
            ));
        }
        if site_name.is_empty() {
            return Err(DerivationError::new(
                DerivationErrorKind::MissingSite,
                "missing site name",
            ));
        }
        if site_counter < 1 {
            return Err(DerivationError::new(
                DerivationErrorKind::InvalidCounter,
                format!("invalid site counter: {site_counter}"),
            ));
        }
        Ok(DerivationRequest {
            user_name,
            master_password,
            site_name,
            site_counter,
            site_type,
        })
    }
}

/// Derive the master key from a user name and master password (MKD).
pub fn master_key_for_user(
    user_name: &[u8],
    master_password: &[u8],
) -> Result<MasterKey, DerivationError> {
    let user_name_len: u32 = user_name.len().try_into().map_err(|_| {
        DerivationError::new(DerivationErrorKind::DerivationFailed, "user name too long")
    })?;

    let mut salt = Secret::new(Vec::with_capacity(SCOPE.len() + 4 + user_name.len()));
    salt.extend_from_slice(SCOPE.as_bytes());
    salt.write_u32::<BigEndian>(user_name_len)?;
    salt.extend_from_slice(user_name);

    let mut master_key = MasterKey::zeroed();
    scrypt(master_password, &salt, &SCRYPT_PARAMS, master_key.as_mut()).map_err(|e| {
        DerivationError::new(
            DerivationErrorKind::DerivationFailed,
            format!("scrypt derivation failed: {e}"),
        )
    })?;
    Ok(master_key)
}

/// Derive the site seed from the master key, site name, and site
/// counter (SSD).
pub fn site_seed_for_site(
    master_key: &MasterKey,
    site_name: &[u8],
    site_counter: u32,
) -> Result<SiteSeed, DerivationError> {
    let site_name_len: u32 = site_name.len().try_into().map_err(|_| {
        DerivationError::new(DerivationErrorKind::DerivationFailed, "site name too long")
    })?;

    let mut info = Secret::new(Vec::with_capacity(SCOPE.len() + 4 + site_name.len() + 4));
    info.extend_from_slice(SCOPE.as_bytes());
    info.write_u32::<BigEndian>(site_name_len)?;
    info.extend_from_slice(site_name);
    info.write_u32::<BigEndian>(site_counter)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(master_key.as_bytes())
        .expect("HMAC-SHA-256 accepts a key of any length");
    mac.update(&info);
    let digest = mac.finalize().into_bytes();

    let mut seed = SiteSeed::zeroed();
    seed.as_mut().copy_from_slice(&digest);
    Ok(seed)
}

/// Render a site seed into a password through the template-directed
/// character-class cipher (TC).
pub fn password_from_seed(
    seed: &SiteSeed,
    password_type: &PasswordType,
    catalog: &Catalog,
) -> Result<String, DerivationError> {
    let templates = catalog.templates.templates_for(password_type)?;
    let bytes = seed.as_bytes();

    let template = &templates[usize::from(bytes[0]) % templates.len()];
    if template.len() + 1 > bytes.len() {
        return Err(DerivationError::new(
            DerivationErrorKind::InvalidTemplate,
            format!(
                "template of length {} needs more seed bytes than the {}-byte seed provides",
                template.len(),
                bytes.len()
            ),
        ));
    }

    let mut password = String::with_capacity(template.len());
    for (i, class_letter) in template.chars().enumerate() {
        let chars = catalog.classes.chars_for(class_letter)?;
        let key_byte = bytes[i + 1];
        let index = usize::from(key_byte) % chars.len();
        password.push(chars.as_bytes()[index] as char);
    }
    Ok(password)
}

/// The request orchestrator: validate → MKD → SSD → TC, zeroizing
/// every secret buffer on every exit path.
pub fn derive(request: DerivationRequest, catalog: &Catalog) -> Result<String, DerivationError> {
    catalog.validate()?;
    let password_type = request.site_type.password_type();

    let master_key = master_key_for_user(
        request.user_name.as_bytes(),
        request.master_password.as_bytes(),
    )?;
    let seed = site_seed_for_site(&master_key, request.site_name.as_bytes(), request.site_counter)?;
    password_from_seed(&seed, &password_type, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_password(user: &str, master: &str, site: &str, counter: u32) -> String {
        let catalog = Catalog::default_catalog();
        let request = DerivationRequest::new(
            user.to_string(),
            Secret::new(master.to_string()),
            site.to_string(),
            counter,
            SiteType::GeneratedLong,
        )
        .unwrap();
        derive(request, &catalog).unwrap()
    }

    #[test]
    fn master_key_matches_known_vector() {
        let master_key = master_key_for_user("John Doe".as_bytes(), "password".as_bytes()).unwrap();
        let expected: [u8; 64] = [
            27, 177, 181, 88, 106, 115, 177, 174, 150, 213, 214, 9, 53, 44, 141, 132, 20, 254, 89,
            228, 224, 58, 95, 52, 226, 174, 130, 64, 244, 84, 216, 6, 136, 210, 95, 208, 201, 115,
            81, 48, 112, 177, 183, 129, 50, 44, 115, 10, 86, 114, 44, 225, 160, 170, 250, 210, 194,
            87, 12, 220, 20, 36, 120, 232,
        ];
        assert_eq!(master_key.as_bytes(), &expected);
    }

    #[test]
    fn long_password_matches_known_vector() {
        assert_eq!(long_password("John Doe", "password", "google.com", 1), "QubnJuvaMoke2~");
    }

    #[test]
    fn unicode_user_name_matches_known_vector() {
        assert_eq!(
            long_password("Max M\u{fc}ller", "passwort", "de.wikipedia.org", 1),
            "DaknJezb6,Zula"
        );
    }

    #[test]
    fn unicode_site_name_matches_known_vector() {
        assert_eq!(
            long_password("Zhang Wei", "password", "\u{5c71}\u{4e1c}\u{5927}\u{5b66}.cn", 1),
            "ZajmGabl0~Zoza"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = long_password("user", "banana colored duckling", "masterpasswordapp.com", 1);
        let b = long_password("user", "banana colored duckling", "masterpasswordapp.com", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn different_counters_diverge() {
        let a = long_password("user", "banana colored duckling", "masterpasswordapp.com", 1);
        let b = long_password("user", "banana colored duckling", "masterpasswordapp.com", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn long_password_is_fourteen_characters_from_its_template_alphabets() {
        let catalog = Catalog::default_catalog();
        let request = DerivationRequest::new(
            "user".to_string(),
            Secret::new("banana colored duckling".to_string()),
            "masterpasswordapp.com".to_string(),
            1,
            SiteType::GeneratedLong,
        )
        .unwrap();
        let password = derive(request, &catalog).unwrap();

        let master_key =
            master_key_for_user("user".as_bytes(), "banana colored duckling".as_bytes()).unwrap();
        let seed = site_seed_for_site(&master_key, "masterpasswordapp.com".as_bytes(), 1).unwrap();
        let templates = catalog
            .templates
            .templates_for(&PasswordType::generated("Long"))
            .unwrap();
        let template = &templates[usize::from(seed.as_bytes()[0]) % templates.len()];

        assert_eq!(password.len(), template.len());
        for (c, class_letter) in password.chars().zip(template.chars()) {
            let alphabet = catalog.classes.chars_for(class_letter).unwrap();
            assert!(alphabet.contains(c));
        }
    }

    #[test]
    fn canonical_cross_implementation_vector_matches_its_selected_template() {
        let catalog = Catalog::default_catalog();
        let request = DerivationRequest::new(
            "Robert Lee Mitchell".to_string(),
            Secret::new("banana colored duckling".to_string()),
            "twitter.com".to_string(),
            1,
            SiteType::GeneratedLong,
        )
        .unwrap();
        let password = derive(request, &catalog).unwrap();

        let master_key = master_key_for_user(
            "Robert Lee Mitchell".as_bytes(),
            "banana colored duckling".as_bytes(),
        )
        .unwrap();
        let seed = site_seed_for_site(&master_key, "twitter.com".as_bytes(), 1).unwrap();
        let templates = catalog
            .templates
            .templates_for(&PasswordType::generated("Long"))
            .unwrap();
        let template = &templates[usize::from(seed.as_bytes()[0]) % templates.len()];

        assert_eq!(password.len(), template.len());
        for (c, class_letter) in password.chars().zip(template.chars()) {
            let alphabet = catalog.classes.chars_for(class_letter).unwrap();
            assert!(alphabet.contains(c));
        }
    }

    #[test]
    fn pin_is_four_digits() {
        let catalog = Catalog::default_catalog();
        let request = DerivationRequest::new(
            "user".to_string(),
            Secret::new("banana colored duckling".to_string()),
            "masterpasswordapp.com".to_string(),
            1,
            SiteType::GeneratedPIN,
        )
        .unwrap();
        let password = derive(request, &catalog).unwrap();
        assert_eq!(password.len(), 4);
        assert!(password.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn name_is_nine_letters_from_vowel_consonant_alphabets() {
        let catalog = Catalog::default_catalog();
        let request = DerivationRequest::new(
            "user".to_string(),
            Secret::new("banana colored duckling".to_string()),
            "masterpasswordapp.com".to_string(),
            1,
            SiteType::GeneratedName,
        )
        .unwrap();
        let password = derive(request, &catalog).unwrap();
        assert_eq!(password.len(), 9);
        let letters = "aeiou".to_string() + "bcdfghjklmnpqrstvwxyz";
        assert!(password.chars().all(|c| letters.contains(c)));
    }

    #[test]
    fn zero_counter_is_rejected() {
        let err = DerivationRequest::new(
            "user".to_string(),
            Secret::new("pw".to_string()),
            "site.com".to_string(),
            0,
            SiteType::GeneratedLong,
        )
        .unwrap_err();
        assert_eq!(err.kind, DerivationErrorKind::InvalidCounter);
    }

    #[test]
    fn empty_user_name_is_rejected() {
        let err = DerivationRequest::new(
            String::new(),
            Secret::new("pw".to_string()),
            "site.com".to_string(),
            1,
            SiteType::GeneratedLong,
        )
        .unwrap_err();
        assert_eq!(err.kind, DerivationErrorKind::MissingUser);
    }

    #[test]
    fn empty_site_name_is_rejected() {
        let err = DerivationRequest::new(
            "user".to_string(),
            Secret::new("pw".to_string()),
            String::new(),
            1,
            SiteType::GeneratedLong,
        )
        .unwrap_err();
        assert_eq!(err.kind, DerivationErrorKind::MissingSite);
    }

    #[test]
    fn very_long_inputs_still_derive() {
        let catalog = Catalog::default_catalog();
        let long_user = "u".repeat(10_000);
        let long_site = "s".repeat(10_000);
        let request = DerivationRequest::new(
            long_user,
            Secret::new("password".to_string()),
            long_site,
            1,
            SiteType::GeneratedLong,
        )
        .unwrap();
        let password = derive(request, &catalog).unwrap();
        assert!(!password.is_empty());
    }

    #[test]
    fn site_type_serializes_to_its_long_name() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            site_type: SiteType,
        }
        let encoded = toml::to_string(&Wrapper {
            site_type: SiteType::GeneratedPIN,
        })
        .unwrap();
        assert_eq!(encoded, "site_type = \"pin\"\n");
    }

    #[test]
    fn site_type_deserializes_from_any_known_alias() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            site_type: SiteType,
        }
        let decoded: Wrapper = toml::from_str("site_type = \"maximum\"").unwrap();
        assert_eq!(decoded.site_type, SiteType::GeneratedMaximum);
    }

    #[test]
    fn site_type_aliases_resolve() {
        assert_eq!(SiteType::from_str("x"), Some(SiteType::GeneratedMaximum));
        assert_eq!(SiteType::from_str("long"), Some(SiteType::GeneratedLong));
        assert_eq!(SiteType::from_str("pin"), Some(SiteType::GeneratedPIN));
        assert_eq!(SiteType::from_str("bogus"), None);
    }
}
