//! Wording of the rent reminder letter
//!
//! Everything here is plain text: which lines appear, in what order, and how
//! the request fields are spliced into them. Placement lives in
//! `rendering::layout`.

use rand::Rng;

use crate::organization::Organization;
use crate::NoticeRequest;

pub const TITLE: &str = "RENT REMINDER NOTICE";
pub const WATERMARK: &str = "OFFICIAL NOTICE";
pub const CLOSING: &str = "Thank you for your prompt attention to this matter.";
pub const DISCLAIMER: &str = "This is an automated notice generated by our system. If you have questions, please contact the management office.";

/// File name written by the standalone generator.
pub const STANDALONE_FILE_NAME: &str = "rent_reminder_notice.png";

const PAYMENT_METHODS_INTRO: &str = "Payment can be made through the following methods:";
const DISREGARD_PARAGRAPH: &str = "If you have already made your payment, kindly disregard this notice and provide proof of payment to the management office for our records.";

/// Placeholder name used when the resident is not known.
pub const DEFAULT_RESIDENT: &str = "Resident";

/// Lines for the bordered resident box, or `None` when no unit was given.
///
/// The name line is left out for the placeholder name (any casing) and for an
/// empty name.
pub fn resident_info_lines(request: &NoticeRequest, org: &Organization) -> Option<Vec<String>> {
    if request.unit_number.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(2);
    if !request.resident_name.is_empty()
        && !request.resident_name.eq_ignore_ascii_case(DEFAULT_RESIDENT)
    {
        lines.push(format!("Resident: {}", request.resident_name));
    }
    lines.push(format!("{}: {}", org.unit_label, request.unit_number));
    Some(lines)
}

pub fn greeting(request: &NoticeRequest) -> String {
    format!("Dear {},", request.resident_name)
}

/// Body text as drawable lines. Empty strings mark paragraph breaks.
pub fn body_lines(request: &NoticeRequest, org: &Organization) -> Vec<String> {
    let mut opening = format!(
        "This is a formal reminder that your rent payment for the current month is due by the {} of this month.",
        request.due_date
    );
    if !request.amount_due.is_empty() {
        opening.push_str(&format!(
            " The amount due is {}{}.",
            org.currency_prefix, request.amount_due
        ));
    }

    let mut lines = vec![
        opening,
        String::new(),
        format!(
            "Please ensure your payment is submitted on time to avoid any late fee charges that may be applicable according to your {}.",
            org.agreement_term
        ),
        String::new(),
        PAYMENT_METHODS_INTRO.to_string(),
    ];
    lines.extend(org.payment_methods.iter().map(|m| format!("\u{2022} {}", m)));
    lines.push(String::new());
    lines.push(DISREGARD_PARAGRAPH.to_string());
    lines.push(String::new());
    lines
}

/// `Date: dd/mm/YYYY`
pub fn date_line(date: chrono::NaiveDate) -> String {
    format!("Date: {}", date.format("%d/%m/%Y"))
}

/// The pair of reference codes printed on a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct References {
    /// Printed under the date, e.g. `RN/4821/2026`
    pub header: String,
    /// Printed in the footer, e.g. `Ref: PV-RR-2026-317`
    pub footer: String,
}

impl References {
    pub fn generate<R: Rng + ?Sized>(org: &Organization, year: i32, rng: &mut R) -> Self {
        let header = format!(
            "{}/{}/{}",
            org.reference_prefix,
            rng.gen_range(1000..=9999),
            year
        );
        let footer = format!(
            "Ref: {}-{}-{}",
            org.footer_reference_prefix,
            year,
            rng.gen_range(100..=999)
        );
        Self { header, footer }
    }

    pub fn header_line(&self) -> String {
        format!("Reference: {}", self.header)
    }
}

/// Attachment name for a download: `rent_reminder_<name>.png` with spaces
/// turned into underscores. Characters that are unsafe in a header or a path
/// are dropped.
pub fn download_file_name(resident_name: &str) -> String {
    let stem: String = resident_name
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    format!("rent_reminder_{}.png", stem)
}
