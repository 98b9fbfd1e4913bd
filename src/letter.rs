//! The letter itself: the request record, the fixed template text, and the
//! rendering pipeline that lays both out onto a single letter-size page.

use crate::document::Document;
use crate::font::Font;
use crate::image::Image;
use crate::info::Info;
use crate::layout::{Flow, Margins, StyledText};
use crate::officers::LoanOfficer;
use crate::page::{Page, SpanFont};
use crate::pagesize;
use crate::units::{In, Pt};
use crate::LetterError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

const FONT_REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const FONT_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

const BODY_SIZE: Pt = Pt(11.0);
const BODY_LEADING: Pt = Pt(15.0);
const FOOTER_SIZE: Pt = Pt(9.0);
const FOOTER_LEADING: Pt = Pt(12.0);

const INTRO: &str = "Congratulations! I am pleased to inform that based on your recently \
    pulled credit report, a review of your income and asset documentation, you have been \
    pre-approved for a mortgage loan subject to the following terms and conditions:";

const CONDITIONS: &str = "Final approval for the loan requires:\n\n\
    \u{2022} Underwriter review and approval of all documentation and required information, \
    including credit, income and assets, and a purchase contract;\n\
    \u{2022} Acceptable appraisal and title commitment;\n\
    \u{2022} Your financial status and credit report to remain substantially the same until \
    the loan closes.";

const CLOSING: &str = "Thank you for allowing us to be a part of this important investment. \
    My team and I look forward to working with you on this important transaction!";

const DISCLAIMER: &str = "*** Your loan application has not yet been approved. This \
    pre-approval expires in 90 days and is subject to change or cancellation if industry, \
    regulatory or program guidelines change. This letter is not a commitment to lend. Any \
    financial decision you make based on this preapproval is your responsibility and not \
    the responsibility of MillerBros. Lending, LLC.***";

/// The loan programs the office writes letters for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LoanType {
    Conventional,
    #[serde(rename = "FHA")]
    Fha,
    #[serde(rename = "VA")]
    Va,
    #[serde(rename = "USDA")]
    Usda,
}

impl LoanType {
    /// Every program, in the order the form offers them
    pub const ALL: [LoanType; 4] = [
        LoanType::Conventional,
        LoanType::Fha,
        LoanType::Va,
        LoanType::Usda,
    ];
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanType::Conventional => "Conventional",
            LoanType::Fha => "FHA",
            LoanType::Va => "VA",
            LoanType::Usda => "USDA",
        };
        write!(f, "{label}")
    }
}

/// One letter's worth of input: the borrower and loan fields straight from
/// the form, plus the selected officer's record copied in. Built fresh per
/// submission and discarded once the PDF exists.
#[derive(Debug, Clone)]
pub struct LetterRequest {
    pub borrower_name: String,
    pub property_address: String,
    pub purchase_price: f64,
    pub loan_type: LoanType,
    pub down_payment: f64,
    pub interest_rate: f64,
    pub officer: LoanOfficer,
}

/// Format a currency amount the way the letter prints it: rounded to whole
/// dollars, thousands-grouped, behind a literal `$`.
pub fn format_dollars(amount: f64) -> String {
    let whole = amount.round() as i64;
    let sign = if whole < 0 { "-" } else { "" };
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}

/// Format a percentage the way the letter prints it: the raw value with no
/// decimal normalization, then a literal `%`. `30` prints as `30%`, `7.25`
/// as `7.25%`; a fractionless float drops its point (`7.0` prints as `7%`).
pub fn format_percent(value: f64) -> String {
    format!("{value}%")
}

/// Render the pre-approval letter for `request` into PDF bytes.
///
/// The layout is fixed: one letter-size page, top-to-bottom blocks, embedded
/// DejaVu Sans faces. A missing logo or signature file is skipped without
/// reserving space; the only failures are font/asset decoding and finalizing
/// the output buffer.
pub fn render(request: &LetterRequest, logo_path: Option<&Path>) -> Result<Vec<u8>, LetterError> {
    let mut doc = Document::default();
    doc.set_info(
        Info::new()
            .title("Loan Pre-Approval Letter")
            .author(&request.officer.name)
            .subject(format!("Pre-approval for {}", request.borrower_name))
            .clone(),
    );

    let regular = doc.add_font(Font::load(FONT_REGULAR.to_vec())?);
    let bold = doc.add_font(Font::load(FONT_BOLD.to_vec())?);
    let body = SpanFont {
        id: regular,
        size: BODY_SIZE,
    };
    let emphasis = SpanFont {
        id: bold,
        size: BODY_SIZE,
    };
    let footer = SpanFont {
        id: regular,
        size: FOOTER_SIZE,
    };

    let page = Page::new(
        pagesize::LETTER,
        Some(Margins::trbl(Pt(50.0), Pt(50.0), Pt(40.0), Pt(50.0))),
    );
    let mut flow = Flow::new(page);

    let logo = match logo_path {
        Some(path) => Image::from_disk_optional(path)?,
        None => None,
    };
    if let Some(logo) = logo {
        let logo = doc.add_image(logo);
        // the letterhead sits partly inside the top margin
        flow.advance(Pt(-25.0));
        flow.image(logo, In(1.8).into(), In(0.7).into());
        flow.advance(Pt(18.0));
    }

    flow.paragraph(
        &doc,
        &[
            StyledText::new("Dear ", body),
            StyledText::new(format!("{},", request.borrower_name), emphasis),
        ],
        BODY_LEADING,
    );
    flow.advance(Pt(12.0));
    flow.paragraph(
        &doc,
        &[StyledText::new("RE: Loan Pre-Approval", emphasis)],
        BODY_LEADING,
    );
    flow.advance(Pt(12.0));
    flow.paragraph(&doc, &[StyledText::new(INTRO, body)], BODY_LEADING);
    flow.advance(Pt(12.0));

    let terms = format!(
        "Purchase Price: {}\nLoan Type: {}\nDown Payment: {}\nInterest Rate: {}\nProperty Address: {}",
        format_dollars(request.purchase_price),
        request.loan_type,
        format_percent(request.down_payment),
        format_percent(request.interest_rate),
        request.property_address,
    );
    flow.paragraph(&doc, &[StyledText::new(terms, body)], BODY_LEADING);
    flow.advance(Pt(12.0));
    flow.paragraph(&doc, &[StyledText::new(CONDITIONS, body)], BODY_LEADING);
    flow.advance(Pt(12.0));
    flow.paragraph(&doc, &[StyledText::new(CLOSING, body)], BODY_LEADING);
    flow.advance(Pt(18.0));

    if let Some(path) = request.officer.signature.as_deref() {
        if let Some(signature) = Image::from_disk_optional(path)? {
            let signature = doc.add_image(signature);
            flow.image(signature, In(2.3).into(), In(0.6).into());
            flow.advance(Pt(2.0));
        }
    }

    let contact = format!(
        "{}\n{}\nNMLS#: {}\nPhone: {}\nEmail: {}",
        request.officer.name,
        request.officer.title,
        request.officer.nmls,
        request.officer.phone,
        request.officer.email,
    );
    flow.paragraph(&doc, &[StyledText::new(contact, body)], BODY_LEADING);
    flow.advance(Pt(25.0));
    flow.paragraph(&doc, &[StyledText::new(DISCLAIMER, footer)], FOOTER_LEADING);

    doc.add_page(flow.into_page());

    let mut buffer = Vec::new();
    doc.write(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::officers::OfficerDirectory;

    fn sample_request(officer: LoanOfficer) -> LetterRequest {
        LetterRequest {
            borrower_name: "Sanjaya Regimi".to_string(),
            property_address: "26 Pisgah Forest Cir. Greensboro, NC 27455".to_string(),
            purchase_price: 285000.0,
            loan_type: LoanType::Conventional,
            down_payment: 30.0,
            interest_rate: 7.0,
            officer,
        }
    }

    fn officer_without_signature() -> LoanOfficer {
        LoanOfficer {
            name: "Danny Davis".to_string(),
            title: "Sr. Loan Officer".to_string(),
            nmls: "115481".to_string(),
            phone: "(919) 447-3377 (Office)".to_string(),
            email: "ddavis@millerlending.com".to_string(),
            signature: None,
        }
    }

    #[test]
    fn dollars_group_thousands_behind_the_sigil() {
        assert_eq!(format_dollars(285000.0), "$285,000");
        assert_eq!(format_dollars(1234567.0), "$1,234,567");
        assert_eq!(format_dollars(950.0), "$950");
        assert_eq!(format_dollars(285000.4), "$285,000");
    }

    #[test]
    fn percentages_keep_the_raw_value() {
        assert_eq!(format_percent(30.0), "30%");
        assert_eq!(format_percent(7.0), "7%");
        assert_eq!(format_percent(7.25), "7.25%");
    }

    #[test]
    fn loan_types_display_their_program_names() {
        let labels: Vec<String> = LoanType::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, ["Conventional", "FHA", "VA", "USDA"]);
    }

    #[test]
    fn rendering_produces_a_pdf_buffer() {
        let request = sample_request(officer_without_signature());
        let pdf = render(&request, None).expect("letter renders");
        assert!(pdf.len() > 1024);
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn missing_logo_is_skipped_not_fatal() {
        let request = sample_request(officer_without_signature());
        let absent = Path::new("assets/never-uploaded-logo.png");
        let with_missing = render(&request, Some(absent)).expect("missing logo tolerated");
        let without = render(&request, None).expect("letter renders");
        assert!(with_missing.starts_with(b"%PDF-"));
        // no space is reserved and no image is embedded, so the two letters
        // serialize to the same size (only metadata timestamps may differ)
        assert_eq!(with_missing.len(), without.len());
    }

    #[test]
    fn present_logo_embeds_an_image_xobject() {
        let logo_path = std::env::temp_dir().join("preletter_test_logo.png");
        image::DynamicImage::new_rgb8(180, 70)
            .save(&logo_path)
            .expect("temp logo writes");

        let request = sample_request(officer_without_signature());
        let with_logo = render(&request, Some(logo_path.as_path())).expect("letter renders");
        let without = render(&request, None).expect("letter renders");
        assert!(with_logo.len() > without.len());
    }

    #[test]
    fn officer_signature_from_the_bundled_roster_is_used_when_present() {
        let directory = OfficerDirectory::builtin(Path::new("assets"));
        let officer = directory.get("Danny Davis").expect("roster officer").clone();
        let request = sample_request(officer);
        let pdf = render(&request, None).expect("letter renders");
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn re_rendering_is_size_stable() {
        let request = sample_request(officer_without_signature());
        let first = render(&request, None).expect("letter renders");
        let second = render(&request, None).expect("letter renders");
        assert_eq!(first.len(), second.len());
    }
}
