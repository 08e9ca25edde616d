//! Letterhead data for the organization issuing the notice

use image::Rgb;

/// Everything on the notice that belongs to the issuer rather than to the
/// resident: letterhead, address block, payment instructions, signature, and
/// the prefixes used when minting reference codes.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    /// Full name, first line of the right-aligned letterhead
    pub name: String,
    /// Second letterhead line
    pub tagline: String,
    /// Label drawn inside the placeholder box when no logo is available
    pub short_name: String,
    pub address_lines: Vec<String>,
    /// One bullet line per method in the body text
    pub payment_methods: Vec<String>,
    /// Contract named in the late fee paragraph (`lease agreement`, ...)
    pub agreement_term: String,
    /// Due date used when a request does not give one
    pub default_due_date: String,
    pub signature: String,
    pub manager_name: String,
    pub manager_title: String,
    /// Prepended verbatim to the amount due (e.g. `KSH`, `KES `)
    pub currency_prefix: String,
    /// Label in front of the unit number inside the resident box
    pub unit_label: String,
    /// Header reference code prefix (`<prefix>/1234/2026`)
    pub reference_prefix: String,
    /// Footer reference code prefix (`Ref: <prefix>-2026-123`)
    pub footer_reference_prefix: String,
    /// Placeholder box colour
    pub accent: Rgb<u8>,
    /// File name of the cached logo inside the logo directory
    pub logo_file: String,
    /// Where to fetch the logo from when the cached file is missing
    pub logo_url: String,
}

impl Organization {
    /// Profile used by the web front end.
    pub fn brandon() -> Self {
        Self {
            name: "Brandon Apartments".to_string(),
            tagline: "Quality Living Spaces".to_string(),
            short_name: "Brandon".to_string(),
            address_lines: vec![
                "Brandon Apartments".to_string(),
                "123 Maple Avenue".to_string(),
                "P.O. Box 45678, Cityville".to_string(),
                "Tel: (555) 123-4567".to_string(),
                "Email: info@brandonapts.com".to_string(),
            ],
            payment_methods: vec![
                "Online payment portal: www.brandonapts.com/pay".to_string(),
                "Direct deposit to our bank account".to_string(),
                "Check payment at the management office during office hours".to_string(),
            ],
            agreement_term: "lease agreement".to_string(),
            default_due_date: "1st".to_string(),
            signature: "Brandon Apartments Management".to_string(),
            manager_name: "Bran Don".to_string(),
            manager_title: "Property Manager".to_string(),
            currency_prefix: "KSH".to_string(),
            unit_label: "Unit Number".to_string(),
            reference_prefix: "RN".to_string(),
            footer_reference_prefix: "PV-RR".to_string(),
            accent: Rgb([51, 102, 153]),
            logo_file: "brandon_logo.png".to_string(),
            logo_url: "https://placehold.co/200x100/789/fff.png?text=Brandon".to_string(),
        }
    }

    /// Hostel profile used by the standalone generator.
    pub fn ywca() -> Self {
        Self {
            name: "YWCA Kenya".to_string(),
            tagline: "Empowering Women, Transforming Communities".to_string(),
            short_name: "YWCA".to_string(),
            address_lines: vec![
                "YWCA Hostels".to_string(),
                "Mamlaka Road, Nairobi".to_string(),
                "P.O. Box 40112-00100, Nairobi, Kenya".to_string(),
                "Tel: +254 (0) 20 2724789".to_string(),
                "Email: info@ywcahostels.co.ke".to_string(),
            ],
            payment_methods: vec![
                "M-Pesa Paybill: 123456, Account: Your Room Number".to_string(),
                "Direct deposit to our bank account".to_string(),
                "Cash payment at the management office during office hours".to_string(),
            ],
            agreement_term: "tenancy agreement".to_string(),
            default_due_date: "10th".to_string(),
            signature: "YWCA Hostels Management".to_string(),
            manager_name: "Mary Wanjiku".to_string(),
            manager_title: "Hostel Manager".to_string(),
            currency_prefix: "KES ".to_string(),
            unit_label: "Room/Unit".to_string(),
            reference_prefix: "RMR".to_string(),
            footer_reference_prefix: "YWCA-RR".to_string(),
            accent: Rgb([0, 85, 164]),
            logo_file: "ywca_logo.png".to_string(),
            logo_url: "https://ywcanairobi.org/wp-content/uploads/2022/05/YWCA-logo.png"
                .to_string(),
        }
    }
}

impl Default for Organization {
    fn default() -> Self {
        Self::brandon()
    }
}
