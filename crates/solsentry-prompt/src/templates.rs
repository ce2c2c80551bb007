//! Localized template sections.
//!
//! JSON key names and grading values are part of the reply contract and are
//! never translated.

use solsentry_core::{Issue, RiskGrading, REPORT_FIELDS};
use solsentry_i18n::Language;

use crate::types::field_value;

/// Header that opens every rendered issue block.
pub(crate) fn issue_header(language: Language) -> &'static str {
    match language {
        Language::English => "Issue #",
        Language::Indonesian => "Temuan #",
    }
}

pub(crate) fn render_no_findings(language: Language) -> &'static str {
    match language {
        Language::English => {
            "No risks were found by the static analyzer. Confirm whether the smart contract is safe. \
Respond ONLY with a single valid JSON object containing the keys risk_summary, recommendation, \
risk_grading (Critical, High, Medium, or Low) and confidence_score (a number from 0.0 to 1.0), \
with no other text."
        }
        Language::Indonesian => {
            "Tidak ada risiko yang ditemukan oleh static analyzer. Konfirmasi apakah smart contract aman. \
Jawab HANYA dengan satu objek JSON valid yang berisi kunci risk_summary, recommendation, \
risk_grading (Critical, High, Medium, atau Low) dan confidence_score (angka dari 0.0 sampai 1.0), \
tanpa teks lain."
        }
    }
}

pub(crate) fn render_role(language: Language) -> &'static str {
    match language {
        Language::English => {
            "You are an expert smart contract security auditor. You will receive the findings that a \
static analyzer reported for a Solidity contract. Analyze them holistically: weigh how the issues \
interact, which ones are exploitable, and what they mean for the contract as a whole.\n\n\
Findings:"
        }
        Language::Indonesian => {
            "Anda adalah auditor keamanan smart contract yang ahli. Anda akan menerima temuan yang \
dilaporkan static analyzer untuk sebuah kontrak Solidity. Analisis secara menyeluruh: pertimbangkan \
bagaimana temuan saling berkaitan, mana yang dapat dieksploitasi, dan apa dampaknya bagi kontrak \
secara keseluruhan.\n\n\
Temuan:"
        }
    }
}

pub(crate) fn render_issue(language: Language, index: usize, issue: &Issue) -> String {
    let (type_label, severity_label, location_label, message_label) = match language {
        Language::English => ("Vulnerability Type", "Severity", "Location", "Message"),
        Language::Indonesian => ("Tipe Kerentanan", "Tingkat Keparahan", "Lokasi", "Pesan"),
    };

    let location = match (issue.has_location(), language) {
        (true, Language::English) => format!("line {}", issue.line),
        (true, Language::Indonesian) => format!("baris {}", issue.line),
        (false, Language::English) => "unknown".to_string(),
        (false, Language::Indonesian) => "tidak diketahui".to_string(),
    };

    format!(
        "{header}{number}\n\
         {type_label}: {issue_type}\n\
         {severity_label}: {severity}\n\
         {location_label}: {location}\n\
         {message_label}: {message}\n",
        header = issue_header(language),
        number = index + 1,
        issue_type = field_value(&issue.issue_type),
        severity = field_value(&issue.severity),
        message = field_value(&issue.message),
    )
}

pub(crate) fn render_closing(language: Language) -> String {
    let gradings = RiskGrading::ALL
        .iter()
        .map(|g| format!("\"{}\"", g.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let [summary, recommendation, grading, confidence] = REPORT_FIELDS;

    match language {
        Language::English => format!(
            "Based on all of the findings above, provide your overall assessment.\n\
             YOUR RESPONSE MUST BE ONLY A SINGLE VALID JSON OBJECT. Do not write any text before or \
after it and do not wrap it in Markdown code fences.\n\
             The object must contain exactly these keys:\n\
             - \"{summary}\": holistic risk summary in 1-2 sentences (non-empty string)\n\
             - \"{recommendation}\": the most important, actionable remediation advice (non-empty string)\n\
             - \"{grading}\": exactly one of {gradings}\n\
             - \"{confidence}\": a number between 0.0 and 1.0 inclusive expressing your confidence"
        ),
        Language::Indonesian => format!(
            "Berdasarkan semua temuan di atas, berikan penilaian menyeluruh Anda.\n\
             JAWABAN ANDA HARUS HANYA BERUPA SATU OBJEK JSON VALID. Jangan menulis teks apa pun \
sebelum atau sesudahnya dan jangan membungkusnya dengan code fence Markdown.\n\
             Objek harus berisi tepat kunci-kunci berikut:\n\
             - \"{summary}\": ringkasan risiko menyeluruh dalam 1-2 kalimat (string tidak kosong)\n\
             - \"{recommendation}\": rekomendasi perbaikan terpenting yang dapat ditindaklanjuti (string tidak kosong)\n\
             - \"{grading}\": tepat salah satu dari {gradings}\n\
             - \"{confidence}\": angka antara 0.0 dan 1.0 (inklusif) yang menyatakan tingkat keyakinan Anda"
        ),
    }
}
