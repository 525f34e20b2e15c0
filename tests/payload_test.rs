// Content strings produced by each page form
use qr_platform::payload::{
    EmailForm, PayloadBuilder, PayloadKind, TextForm, UrlForm, VcardForm, WhatsappForm, compose_phone,
    encode_uri_component,
};

#[test]
fn vcard_with_prefixed_local_number() {
    let form = VcardForm {
        name: "Ravi".to_string(),
        country_code: "+91".to_string(),
        phone: "919876543210".to_string(),
        ..Default::default()
    };

    let card = form.content().expect("valid vcard");
    let lines: Vec<&str> = card.split('\n').collect();

    assert_eq!(lines.first(), Some(&"BEGIN:VCARD"));
    assert_eq!(lines.last(), Some(&"END:VCARD"));
    assert!(lines.contains(&"TEL;TYPE=CELL:+919876543210"));
    assert!(lines.contains(&"FN:Ravi"));
    assert!(lines.contains(&"N:Ravi;;;;"));
}

#[test]
fn whatsapp_link_with_message() {
    let form = WhatsappForm {
        country_code: "+91".to_string(),
        number: "9876543210".to_string(),
        message: "hi".to_string(),
    };

    assert_eq!(form.content().as_deref(), Ok("https://wa.me/919876543210?text=hi"));
}

#[test]
fn email_without_subject_or_body() {
    let form = EmailForm {
        address: "a@b.com".to_string(),
        ..Default::default()
    };

    assert_eq!(form.content().as_deref(), Ok("mailto:a@b.com"));
}

#[test]
fn url_without_scheme_is_rejected_before_rendering() {
    let err = UrlForm::new("example.com").content().expect_err("must be rejected");
    assert_eq!(err.field, "url");
}

#[test]
fn text_is_raw_trimmed_input() {
    let form = TextForm {
        text: "\n  Wi-Fi: guest / pass123  \n".to_string(),
    };
    assert_eq!(form.content().as_deref(), Ok("Wi-Fi: guest / pass123"));
}

#[test]
fn builders_report_their_page_kind() {
    let builders: Vec<Box<dyn PayloadBuilder>> = vec![
        Box::new(EmailForm::default()),
        Box::new(TextForm::default()),
        Box::new(UrlForm::new("")),
        Box::new(UrlForm::instant("")),
        Box::new(VcardForm::default()),
        Box::new(WhatsappForm::default()),
    ];
    let kinds: Vec<PayloadKind> = builders.iter().map(|b| b.kind()).collect();

    assert_eq!(
        kinds,
        vec![
            PayloadKind::Email,
            PayloadKind::Text,
            PayloadKind::Url,
            PayloadKind::InstantUrl,
            PayloadKind::Vcard,
            PayloadKind::Whatsapp,
        ]
    );
    assert!(builders.iter().all(|b| b.validate().is_err()));
}

#[test]
fn page_kind_parses_from_cli_names() {
    assert_eq!("instant-url".parse::<PayloadKind>(), Ok(PayloadKind::InstantUrl));
    assert_eq!("WhatsApp".parse::<PayloadKind>(), Ok(PayloadKind::Whatsapp));
    assert!("sms".parse::<PayloadKind>().is_err());
}

#[test]
fn phone_composition_and_encoding_helpers() {
    assert_eq!(compose_phone("+091", "98765 43210"), ("91".to_string(), "9876543210".to_string()));
    assert_eq!(encode_uri_component("Meet @ 5pm? (ok)"), "Meet%20%40%205pm%3F%20(ok)");
}
