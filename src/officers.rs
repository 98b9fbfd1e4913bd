use crate::LetterError;
use std::path::{Path, PathBuf};

/// A loan officer who can issue pre-approval letters. Values land verbatim
/// in the letter's contact block.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanOfficer {
    /// Display name, unique within the directory
    pub name: String,
    pub title: String,
    /// NMLS regulatory license number
    pub nmls: String,
    pub phone: String,
    pub email: String,
    /// Scanned signature image; the letter omits the signature when this is
    /// `None` or the file is absent
    pub signature: Option<PathBuf>,
}

/// The static officer roster: populated once at startup, read-only for the
/// process lifetime. Entry order is presentation order, so the first officer
/// is the form's default selection.
#[derive(Debug, Clone)]
pub struct OfficerDirectory {
    officers: Vec<LoanOfficer>,
}

impl OfficerDirectory {
    /// The built-in roster. Signature images are resolved against
    /// `assets_dir` and may be absent on disk.
    pub fn builtin(assets_dir: &Path) -> OfficerDirectory {
        OfficerDirectory {
            officers: vec![
                LoanOfficer {
                    name: "Danny Davis".to_string(),
                    title: "Sr. Loan Officer".to_string(),
                    nmls: "115481".to_string(),
                    phone: "(919) 447-3377 (Office)".to_string(),
                    email: "ddavis@millerlending.com".to_string(),
                    signature: Some(assets_dir.join("signatures/danny_davis.png")),
                },
                LoanOfficer {
                    name: "Maria Keller".to_string(),
                    title: "Loan Officer".to_string(),
                    nmls: "208733".to_string(),
                    phone: "(919) 447-3382 (Office)".to_string(),
                    email: "mkeller@millerlending.com".to_string(),
                    signature: None,
                },
            ],
        }
    }

    /// Look up an officer by display name. The form's selector only offers
    /// directory names, so a miss means the caller bypassed the form.
    pub fn get(&self, name: &str) -> Result<&LoanOfficer, LetterError> {
        self.officers
            .iter()
            .find(|officer| officer.name == name)
            .ok_or_else(|| LetterError::UnknownOfficer(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoanOfficer> {
        self.officers.iter()
    }

    pub fn len(&self) -> usize {
        self.officers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.officers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_leads_with_danny_davis() {
        let directory = OfficerDirectory::builtin(Path::new("assets"));
        assert!(!directory.is_empty());
        assert_eq!(directory.len(), 2);
        let first = directory.iter().next().expect("roster is not empty");
        assert_eq!(first.name, "Danny Davis");
        assert_eq!(first.nmls, "115481");
        assert!(first.signature.is_some());
    }

    #[test]
    fn lookup_by_exact_name() {
        let directory = OfficerDirectory::builtin(Path::new("assets"));
        let officer = directory.get("Maria Keller").expect("officer is listed");
        assert_eq!(officer.title, "Loan Officer");
        assert!(officer.signature.is_none());
    }

    #[test]
    fn unknown_name_fails_the_lookup() {
        let directory = OfficerDirectory::builtin(Path::new("assets"));
        let err = directory.get("Nobody Particular").expect_err("not in roster");
        assert!(matches!(err, LetterError::UnknownOfficer(name) if name == "Nobody Particular"));
    }
}
