//! Lead payload rendering: ADF/XML prospect, HTML table, text summary and
//! subject line.
//!
//! Missing optional fields are never an error: absent vehicle details are
//! simply left out of every payload.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::PayloadFormat;
use crate::models::{Attachment, Lead};

/// Rows that lead the summary, in this order, with their display labels.
/// Any other non-empty field follows in lexicographic key order.
pub const PREFERRED_FIELDS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("vin", "VIN"),
    ("year", "Year"),
    ("make", "Make"),
    ("model", "Model"),
    ("trim", "Trim"),
    ("mileage", "Mileage"),
    ("extColor", "Exterior Color"),
    ("intColor", "Interior Color"),
    ("condition", "Overall Condition"),
    ("accidentHistory", "Accident History"),
    ("mechanicalIssues", "Mechanical Issues"),
    ("warningLights", "Warning Lights"),
    ("tireCondition", "Tire Condition"),
    ("windshieldDamage", "Windshield Damage"),
    ("smokedIn", "Smoked In"),
    ("numberOfKeys", "Number of Keys"),
    ("loanPayoff", "Loan Payoff"),
    ("comments", "Comments"),
    ("referrer", "Referrer"),
    ("landingPage", "Landing Page"),
    ("submittedAt", "Submitted At"),
];

/// Static inputs for rendering, taken from configuration.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub format: PayloadFormat,
    pub subject_label: String,
    pub vendor_name: String,
    pub provider_name: String,
    pub phone_country_code: String,
}

impl From<&crate::config::Config> for RenderSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            format: config.payload_format,
            subject_label: config.subject_label.clone(),
            vendor_name: config.vendor_name.clone(),
            provider_name: config.provider_name.clone(),
            phone_country_code: config.phone_country_code.clone(),
        }
    }
}

/// Everything the dispatcher needs to build an email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLead {
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Renders the payloads selected by `settings.format`.
pub fn render(lead: &Lead, settings: &RenderSettings) -> RenderedLead {
    let subject = subject_line(&settings.subject_label, lead);

    match settings.format {
        PayloadFormat::Adf => RenderedLead {
            subject,
            text: render_adf(lead, settings),
            html: None,
            attachments: Vec::new(),
        },
        PayloadFormat::Html => RenderedLead {
            subject,
            text: render_text_summary(lead),
            html: Some(render_html_table(&settings.subject_label, lead)),
            attachments: Vec::new(),
        },
        PayloadFormat::Both => {
            let xml = render_adf(lead, settings);
            RenderedLead {
                subject,
                text: render_text_summary(lead),
                html: Some(render_html_table(&settings.subject_label, lead)),
                attachments: vec![Attachment {
                    filename: adf_filename(lead),
                    content: STANDARD.encode(xml.as_bytes()),
                }],
            }
        }
    }
}

/// `"<label> — <name> — <year> <make> <model>"`, skipping empty vehicle tokens.
pub fn subject_line(label: &str, lead: &Lead) -> String {
    let vehicle = collapse_whitespace(&format!("{} {} {}", lead.year, lead.make, lead.model));
    let head = collapse_whitespace(&format!("{} — {}", label, lead.name));
    if vehicle.is_empty() {
        head
    } else {
        format!("{} — {}", head, vehicle)
    }
}

/// Ordered `(label, value)` rows for the human-readable payloads.
pub fn summary_rows(lead: &Lead) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    for (key, label) in PREFERRED_FIELDS {
        if let Some(value) = lead.get(key).filter(|v| !v.is_empty()) {
            rows.push((label.to_string(), value.to_string()));
        }
    }

    let mut remaining: Vec<(&str, &str)> = lead
        .fields()
        .into_iter()
        .filter(|(key, value)| !value.is_empty() && !is_preferred(key))
        .collect();
    remaining.sort_by(|a, b| a.0.cmp(b.0));
    rows.extend(
        remaining
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );

    rows
}

pub fn render_html_table(title: &str, lead: &Lead) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<h2 style=\"font-family:Arial,sans-serif\">{}</h2>\n",
        escape_html(title)
    ));
    html.push_str(
        "<table cellpadding=\"6\" cellspacing=\"0\" border=\"1\" \
         style=\"border-collapse:collapse;font-family:Arial,sans-serif;font-size:14px\">\n",
    );
    for (label, value) in summary_rows(lead) {
        html.push_str(&format!(
            "  <tr><th align=\"left\">{}</th><td>{}</td></tr>\n",
            escape_html(&label),
            escape_html(&value)
        ));
    }
    html.push_str("</table>\n");
    html
}

pub fn render_text_summary(lead: &Lead) -> String {
    summary_rows(lead)
        .into_iter()
        .map(|(label, value)| format!("{}: {}\n", label, value))
        .collect()
}

/// ADF 1.0 prospect document for dealer CRM import.
pub fn render_adf(lead: &Lead, settings: &RenderSettings) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<?adf version=\"1.0\"?>\n");
    xml.push_str("<adf>\n");
    xml.push_str("  <prospect status=\"new\">\n");
    xml.push_str(&format!(
        "    <id sequence=\"1\" source=\"{}\">{}</id>\n",
        escape_xml(&settings.provider_name),
        lead.id
    ));
    xml.push_str(&format!(
        "    <requestdate>{}</requestdate>\n",
        escape_xml(&lead.submitted_at)
    ));

    xml.push_str("    <vehicle interest=\"trade-in\" status=\"used\">\n");
    xml.push_str(&element(6, "vin", &lead.vin));
    xml.push_str(&optional_element(6, "year", &lead.year));
    xml.push_str(&optional_element(6, "make", &lead.make));
    xml.push_str(&optional_element(6, "model", &lead.model));
    xml.push_str(&optional_element(6, "trim", &lead.trim));
    if !lead.mileage.is_empty() {
        xml.push_str(&format!(
            "      <odometer status=\"original\" units=\"mi\">{}</odometer>\n",
            escape_xml(&lead.mileage)
        ));
    }
    if !lead.ext_color.is_empty() || !lead.int_color.is_empty() {
        xml.push_str("      <colorcombination>\n");
        xml.push_str(&optional_element(8, "interiorcolor", &lead.int_color));
        xml.push_str(&optional_element(8, "exteriorcolor", &lead.ext_color));
        xml.push_str("        <preference>1</preference>\n");
        xml.push_str("      </colorcombination>\n");
    }
    xml.push_str("    </vehicle>\n");

    xml.push_str("    <customer>\n");
    xml.push_str("      <contact>\n");
    xml.push_str(&format!(
        "        <name part=\"full\">{}</name>\n",
        escape_xml(&lead.name)
    ));
    xml.push_str(&element(8, "email", &lead.email));
    xml.push_str(&format!(
        "        <phone type=\"voice\">{}{}</phone>\n",
        escape_xml(&settings.phone_country_code),
        escape_xml(&lead.phone)
    ));
    xml.push_str("      </contact>\n");
    xml.push_str("    </customer>\n");

    xml.push_str("    <vendor>\n");
    xml.push_str("      <contact>\n");
    xml.push_str(&format!(
        "        <name part=\"full\">{}</name>\n",
        escape_xml(&settings.vendor_name)
    ));
    xml.push_str("      </contact>\n");
    xml.push_str("    </vendor>\n");

    xml.push_str("    <provider>\n");
    xml.push_str(&format!(
        "      <name part=\"full\">{}</name>\n",
        escape_xml(&settings.provider_name)
    ));
    xml.push_str("    </provider>\n");

    if let Some(comments) = adf_comments(lead) {
        xml.push_str(&element(4, "comments", &comments));
    }

    xml.push_str("  </prospect>\n");
    xml.push_str("</adf>\n");
    xml
}

fn adf_comments(lead: &Lead) -> Option<String> {
    let mut parts = Vec::new();
    if !lead.referrer.is_empty() {
        parts.push(format!("Referrer: {}", lead.referrer));
    }
    if !lead.landing_page.is_empty() {
        parts.push(format!("Landing page: {}", lead.landing_page));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn adf_filename(lead: &Lead) -> String {
    let vin: String = lead
        .vin
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("trade-in-lead-{}.xml", vin)
}

fn element(indent: usize, tag: &str, value: &str) -> String {
    format!(
        "{:indent$}<{tag}>{}</{tag}>\n",
        "",
        escape_xml(value),
        indent = indent,
        tag = tag
    )
}

fn optional_element(indent: usize, tag: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        element(indent, tag, value)
    }
}

fn is_preferred(key: &str) -> bool {
    PREFERRED_FIELDS.iter().any(|(k, _)| *k == key)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes `&`, `<` and `>` for embedding user input in HTML text.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text and attribute values for XML.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && !matches!(c, '\n' | '\r' | '\t') => {}
            _ => out.push(c),
        }
    }
    out
}
