//! Built-in header families and their curated value lists
//!
//! Value lists combine a few basic probes, values from public conformance
//! suites and earlier header studies, and hand-picked edge cases. Values may
//! contain [`URL_REP`]; they are expanded over [`UrlForms`] at construction.

use super::values::{UrlForms, URL_REP};
use crate::config::HostConfig;
use headerprobe_common::{Header, RespType, ResponseSpec};

/// One probed header and its value classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFamily {
    pub label: String,
    /// Canonical lower-case header name
    pub header_name: String,
    /// Legacy and invalid alternative names
    pub alt_names: Vec<String>,
    pub block_values: Vec<String>,
    pub allow_values: Vec<String>,
    pub partial_values: Vec<String>,
    /// Values that should no longer have an effect
    pub legacy_values: Vec<String>,
    /// Everything else; starts with the empty value and "INVALID"
    pub other_values: Vec<String>,
    /// Headers appended after the probed headers of every response
    pub base_resp: Vec<Header>,
}

impl HeaderFamily {
    /// Block, allow and partial values in that order
    pub fn valid_values(&self) -> Vec<String> {
        self.block_values
            .iter()
            .chain(&self.allow_values)
            .chain(&self.partial_values)
            .cloned()
            .collect()
    }

    /// Every value of the family
    pub fn all_values(&self) -> Vec<String> {
        let mut values = self.valid_values();
        values.extend(self.legacy_values.iter().cloned());
        values.extend(self.other_values.iter().cloned());
        values
    }

    /// Append raw values (may contain [`URL_REP`]) to `other_values`
    pub fn extend_other_values(&mut self, raw: &[String], forms: &UrlForms) {
        self.other_values.extend(forms.expand(raw));
    }
}

/// Several headers probed together in every order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiHeaderFamily {
    pub label: String,
    /// Header name with the values it cycles through
    pub headers: Vec<(String, Vec<String>)>,
    pub base_resp: Vec<Header>,
}

/// Small fixed response sets for the debug and basic modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCorpus {
    pub label: String,
    /// One blocking and one allowing response
    pub debug: Vec<Vec<Header>>,
    pub basic: Vec<Vec<Header>>,
    /// Served as 302 with the redirect-to-empty header appended
    pub redirects: Vec<Vec<Header>>,
}

impl BasicCorpus {
    /// All responses of this corpus
    pub fn specs(&self, redirect: &Header) -> Vec<ResponseSpec> {
        let debug = self
            .debug
            .iter()
            .map(|headers| ResponseSpec::new(headers.clone(), &self.label).with_resp_type(RespType::Debug));
        let basic = self
            .basic
            .iter()
            .map(|headers| ResponseSpec::new(headers.clone(), &self.label).with_resp_type(RespType::Basic));
        let redirects = self.redirects.iter().map(|headers| {
            let mut headers = headers.clone();
            headers.push(redirect.clone());
            ResponseSpec::new(headers, &self.label)
                .with_status(302)
                .with_resp_type(RespType::Basic)
        });
        debug.chain(basic).chain(redirects).collect()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn header(name: &str, value: &str) -> Header {
    (name.to_string(), value.to_string())
}

const BASIC_VALUES: [&str; 5] = ["", "INVALID", "null", "*", URL_REP];

const CORS_BASIC_VALUES: [&str; 14] = [
    "", "INVALID", "null", "*", "Test", "true", "?1", "?0", "TEST", "test", "false", "https://",
    "//", URL_REP,
];

struct FamilySpec<'a> {
    label: &'a str,
    header_name: &'a str,
    alt_names: &'a [&'a str],
    block: &'a [&'a str],
    allow: &'a [&'a str],
    partial: Vec<String>,
    legacy: Vec<String>,
    other: Vec<String>,
}

impl FamilySpec<'_> {
    fn build(self, forms: &UrlForms) -> HeaderFamily {
        HeaderFamily {
            label: self.label.to_string(),
            header_name: self.header_name.to_string(),
            alt_names: strings(self.alt_names),
            block_values: strings(self.block),
            allow_values: strings(self.allow),
            partial_values: self.partial,
            legacy_values: self.legacy,
            other_values: forms.expand(&self.other),
            base_resp: Vec::new(),
        }
    }
}

/// `basic` followed by each further list, as owned strings
fn concat(lists: &[&[&str]]) -> Vec<String> {
    lists.iter().flat_map(|list| list.iter()).map(|v| v.to_string()).collect()
}

const CSP_ALT_NAMES: [&str; 3] = [
    "x-content-security-policy",
    "x-webkit-csp",
    "x-webkit-content-security-policy",
];

/// The full parsing family table
pub fn builtin_families(hosts: &HostConfig) -> Vec<HeaderFamily> {
    let forms = UrlForms::new(hosts);
    let origin_s = forms.origin_s().to_string();
    let mut families = Vec::new();

    families.push(
        FamilySpec {
            label: "XFO",
            header_name: "x-frame-options",
            alt_names: &[
                "frame-options",
                "x-frame-option",
                "x-frames-options",
                "content-security-policy",
                "x_frame_options",
                "xframeoptions",
            ],
            block: &["DENY"],
            allow: &["ALLOWALL"],
            partial: strings(&["SAMEORIGIN"]),
            legacy: vec![format!("ALLOW-FROM {}", origin_s)],
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "", "SAMEORIGIN", "  SAMEORIGIN ", "\"SAMEORIGIN,DENY\"",
                    "  SAMEORIGIN,    DENY", "  DENY ", "ALLOWALL", "\"DENY\"",
                    "ALLOW-FROM <!URL!>", "denY", "\"SAMEORIGIN\"", "sameOriGin", "DENY",
                    ",SAMEORIGIN,,DENY,", "INVALID", "allowAll", "sameOrigin",
                    "ALLOW-FROM=<!URL!>",
                ],
                &[
                    "deny, deny", "allow-from <!URL!>; allow-from <!URL!>", "deny, sameorigin",
                    "deny, allow-from <!URL!>", "RANDOMDIRECTIVE", "deny; deny",
                    "deny; allow-from <!URL!>", "allowall", "allow-from <!URL!>, allow-from <!URL!>",
                    "deny; sameorigin", "sameorigin, allow-from <!URL!>", "allow-from <!URL!>",
                    "allow-from <!URL!>, deny", "sameorigin", "sameorigin, deny", "deny",
                    "sameorigin, sameorigin", "sameorigin; deny", "allow-from <!URL!>, sameorigin",
                    "sameorigin; sameorigin", "allow-from <!URL!>; deny",
                ],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "CSP-FA",
            header_name: "content-security-policy",
            alt_names: &CSP_ALT_NAMES,
            block: &["frame-ancestors 'none'"],
            allow: &["frame-ancestors *"],
            partial: strings(&["frame-ancestors 'self'"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "frame-ancestors 'none'", "frame-ancestors 'self'", "frame-ancestors *",
                    "frame-ancestors <!URL!>",
                ],
                &[
                    "frame-ancestors https:;", "frame-ancestors http:;",
                    "frame-ancestors <!URL!> <!URL!>;", "frame-ancestors <!URL!>;",
                ],
                &[
                    "default-src 'none'", "self", "*", "frame-ancestors self", "frame-ancestors",
                    "frame-ancestors none", "frame-src none", "frame-ancestors 'null'",
                    "frame-ancestors null",
                ],
            ]),
        }
        .build(&forms),
    );

    families.extend(cors_families(&forms));

    families.push(
        FamilySpec {
            label: "CORP",
            header_name: "cross-origin-resource-policy",
            alt_names: &["from-origin", "x-cross-origin-resource-policy"],
            block: &[""],
            allow: &["cross-origin"],
            partial: strings(&["same-site", "same-origin"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "same", "same, same-origin", "SAME-ORIGIN", "Same-Origin", "same-origin, <>",
                    "same-origin, same-origin", URL_REP,
                ],
                &["unsafe-none"],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "COEP",
            header_name: "cross-origin-embedder-policy",
            alt_names: &["x-cross-origin-embedder-policy"],
            block: &["require-corp"],
            allow: &["unsafe-none"],
            partial: strings(&["credentialless"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "jibberish", "require%FFcorp", "require-corp;", "\u{000B}require-corp\u{000B}",
                    "\u{000C}require-corp\u{000C}", "\u{000D}require-corp\u{000D}", "Require-corp",
                    "\"require-corp\"", ":cmVxdWlyZS1jb3Jw:", "require-corp;\tfoo=bar",
                    "require-corp require-corp", "require-corp,require-corp", "require-corp",
                    " require-corp ", "\trequire-corp\t", " \trequire-corp", "require-corp\t ",
                    "require-corp; foo=bar", "require-corp;require-corp",
                    "require-corp; report-to=\"data:",
                ],
                &["cross-origin", "same-origin"],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "COOP",
            header_name: "cross-origin-opener-policy",
            alt_names: &["x-cross-origin-opener-policy"],
            block: &[],
            allow: &["unsafe-none"],
            partial: strings(&["same-origin", "same-origin-allow-popups"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "same-origin;", "\u{000B}same-origin\u{000B}", "\u{000C}same-origin\u{000C}",
                    "\u{000D}same-origin\u{000D}", "Same-origin", "same-origin;\tfoo=bar",
                    "same-origin ;foo=bar", "same-origin; foo=bar;", "\"same-origin\"",
                    ":c2FtZS1vcmlnaW4=:", "?1", "1", "$same-origin", "same-origin same-origin",
                    "same-origin\\,same-origin", "*same-origin ", "same%FForigin", " same-origin",
                    "same-origin ", "\tsame-origin", "same-origin\t", "same-origin;same-origin",
                    "same-origin; foo=bar",
                ],
                &["cross-origin", "same-origin", "same-origin-plus-COEP"],
            ]),
        }
        .build(&forms),
    );

    for (label, directive) in [("CSP-SCRIPT", "script-src"), ("CSP-IMG", "img-src")] {
        let mut other = concat(&[&BASIC_VALUES]);
        if directive == "img-src" {
            other.extend(
                ["'none'", "'self'", "*", URL_REP]
                    .iter()
                    .map(|v| format!("{} {}", directive, v)),
            );
        }
        other.extend(strings(&["default-src 'none'", "self", "*"]));
        other.extend(
            ["self", "", "none", "none", "'null'", "null"]
                .iter()
                .map(|v| {
                    if v.is_empty() {
                        directive.to_string()
                    } else {
                        format!("{} {}", directive, v)
                    }
                }),
        );
        if directive == "script-src" {
            other.push(format!("script-src-elem {}", URL_REP));
            other.push(format!("script-src-attr {}", URL_REP));
        } else {
            other.push("frame-src none".to_string());
        }

        families.push(HeaderFamily {
            label: label.to_string(),
            header_name: "content-security-policy".to_string(),
            alt_names: strings(&CSP_ALT_NAMES),
            block_values: vec![format!("{} 'none'", directive)],
            allow_values: vec![format!("{} *", directive)],
            partial_values: vec![format!("{} 'self'", directive)],
            legacy_values: Vec::new(),
            other_values: forms.expand(&other),
            base_resp: Vec::new(),
        });
    }

    families.push(
        FamilySpec {
            label: "HSTS",
            header_name: "strict-transport-security",
            alt_names: &["x-strict-transport-security", "hsts"],
            block: &["max-age=0"],
            allow: &[],
            partial: strings(&["max-age=60", "max-age=20; includeSubDomains"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "max-age=60; max-age=120", "max-age=60; someDirective, max-age=60; someDirective",
                    "max-age=60; preload", "max-age=0, max-age=60",
                    "max-age=60, max-age=60; max-age=60; includeSubdomains",
                    "max-age=60; includeSubDomains",
                    "random, includeSubdomains; max-age=60; includeSubdomains",
                    "max-age=60; max-age=0", "max-age=60, max-age=120", "max-age=60, max-age=60",
                    "max-age=60; max-age=60, includeSubdomains",
                    "max-age=60, includeSubdomains; max-age=60; includeSubdomains",
                    "includeSubDomains", "max-age=60; max-age=60", "max-age=60,; includeSubdomains",
                    "max-age=60; preload; preload", "max-age=60", "max-age=0",
                    "max-age=60; includeSubDomains; preload",
                    "max-age=60, x; max-age=60; includeSubdomains",
                    "max-age=60; includeSubdomains; max-age=60, includeSubdomains",
                    "max-age=60; includeSubDomains, max-age=60; includeSubDomains",
                    "max-age=60, includeSubdomains", "max-age=60; someDirective; someDirective",
                    "max-age=60, max-age=0", "max-age=0; max-age=60", "max-age=120",
                    "max-age=60; includeSubDomains; includeSubDomains", "preload",
                    "max-age=60; preload, max-age=60; preload",
                    "x, max-age=60; max-age=60; includeSubdomains",
                    "max-age=60; includeSubdomains, max-age=60", "max-age=60; ,",
                ],
                &["includeSubDomains", "max-age=-5", "max-age=60; includeSubDomains; preload"],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "PP",
            header_name: "permissions-policy",
            alt_names: &["x-permissions-policy", "feature-policy"],
            block: &["fullscreen=()"],
            allow: &["fullscreen=(*)"],
            partial: strings(&["fullscreen=(self)"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "fullscreen=", "fullscreen=*", "fullscreen=()", "fullscreen=(self)",
                    "fullscreen=(<!URL!>)", "fullscreen=(self none)", "fullscreen=(self,none)",
                    "fullscreen=(src)",
                ],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "RP",
            header_name: "referrer-policy",
            alt_names: &["x-referrer-policy", "referer-policy"],
            block: &["no-referrer"],
            allow: &["unsafe-url"],
            partial: strings(&["same-origin"]),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &[
                    "no-referrer-when-downgrade", "origin", "strict-origin",
                    "origin-when-cross-origin", "strict-origin-when-cross-origin",
                ],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "TAO",
            header_name: "timing-allow-origin",
            alt_names: &["x-timing-allow-origin"],
            block: &["null"],
            allow: &["*"],
            partial: Vec::new(),
            legacy: Vec::new(),
            other: concat(&[
                &BASIC_VALUES,
                &["self", "'self'", "<!URL!> <!URL!>", "<!URL!>,<!URL!>"],
            ]),
        }
        .build(&forms),
    );

    families.push(
        FamilySpec {
            label: "XCTO",
            header_name: "x-content-type-options",
            alt_names: &["content-type-options"],
            block: &["nosniff"],
            allow: &[],
            partial: Vec::new(),
            legacy: Vec::new(),
            other: concat(&[
                &["", "INVALID", "nosniff", "no-sniff"],
                &[
                    "NOSNIFF", "nosniff,,@#$#%%&^&^*()()11!", "@#$#%%&^&^*()()11!,nosniff", "no", "",
                    ",nosniff", "nosniff\u{000C}", "nosniff\u{000B},nosniff", "'NosniFF'",
                    "\"nosniFF\"",
                ],
                &["SNIFF", "no", "always", "maybe"],
            ]),
        }
        .build(&forms),
    );

    families
}

/// One family per CORS response header; the other CORS headers stay fixed
fn cors_families(forms: &UrlForms) -> Vec<HeaderFamily> {
    let origin_s = forms.origin_s().to_string();
    let full_base_resp = vec![
        header("Test", "Test"),
        header("access-control-allow-origin", &origin_s),
        header("access-control-allow-credentials", "true"),
        header("access-control-allow-methods", "TEST"),
        header("access-control-allow-headers", "Test"),
        header("access-control-expose-headers", "Test"),
    ];

    let table: [(&str, &str, &[&str], &[&str], Vec<String>); 5] = [
        ("CORS-ACAO", "access-control-allow-origin", &["null"], &["*"], vec![origin_s.clone()]),
        ("CORS-ACAC", "access-control-allow-credentials", &[], &["true"], Vec::new()),
        ("CORS-ACAM", "access-control-allow-methods", &[], &["*"], strings(&["TEST"])),
        ("CORS-ACAH", "access-control-allow-headers", &[], &["*"], strings(&["Test"])),
        ("CORS-ACEH", "access-control-expose-headers", &[], &["*"], strings(&["Test"])),
    ];

    table
        .into_iter()
        .map(|(label, name, block, allow, partial)| HeaderFamily {
            label: label.to_string(),
            header_name: name.to_string(),
            alt_names: Vec::new(),
            block_values: strings(block),
            allow_values: strings(allow),
            partial_values: partial,
            legacy_values: Vec::new(),
            other_values: forms.expand(&strings(&CORS_BASIC_VALUES)),
            base_resp: full_base_resp
                .iter()
                .filter(|(n, _)| n != name)
                .cloned()
                .collect(),
        })
        .collect()
}

/// CSP frame-ancestors against X-Frame-Options
pub fn builtin_multi_families(families: &[HeaderFamily]) -> Vec<MultiHeaderFamily> {
    let Some(csp_fa) = families.iter().find(|f| f.label == "CSP-FA") else {
        return Vec::new();
    };
    vec![MultiHeaderFamily {
        label: "CSPvsXFO".to_string(),
        headers: vec![
            ("content-security-policy".to_string(), csp_fa.all_values()),
            (
                "x-frame-options".to_string(),
                strings(&["DENY", "", "INVALID", "SAMEORIGIN"]),
            ),
        ],
        base_resp: Vec::new(),
    }]
}

/// Build a corpus probing one header with a list of single values
fn single_header_corpus(
    label: &str,
    name: &str,
    deny: &str,
    allow: &str,
    values: &[String],
    joined: Option<String>,
    redirect_values: [&str; 2],
) -> BasicCorpus {
    let mut basic: Vec<Vec<Header>> = values.iter().map(|v| vec![header(name, v)]).collect();
    basic.push(Vec::new());
    if let Some(joined) = joined {
        basic.push(vec![header(name, &joined)]);
    }
    BasicCorpus {
        label: label.to_string(),
        debug: vec![vec![header(name, deny)], vec![header(name, allow)]],
        basic,
        redirects: redirect_values
            .iter()
            .map(|v| vec![header(name, v)])
            .collect(),
    }
}

/// The debug and basic corpora
pub fn builtin_basic_corpora(hosts: &HostConfig) -> Vec<BasicCorpus> {
    let base = &hosts.base_host;
    let site = format!("sub.{}", base);
    let origin_s = format!("https://sub.{}", base);
    let origin = format!("http://sub.{}", base);
    let origin_sp = format!("{}:443", origin_s);
    let home = format!("{}/", origin_s);
    let home_p = format!("{}/", origin_sp);
    let parent = format!("https://{}", base);
    let parent_childs = format!("*.{}", base);
    let self_childs = format!("*.sub.{}", base);

    let mut corpora = Vec::new();

    corpora.push(single_header_corpus(
        "XFO",
        "x-frame-options",
        "DENY",
        "SAMEORIGIN",
        &strings(&["DENY", "SAMEORIGIN", "INVALID", "ALLOWALL", "", "null", "*"]),
        Some("DENY, INVALID, ALLOWALL".to_string()),
        ["SAMEORIGIN", "INVALID"],
    ));

    for (label, directive) in [
        ("CSP-FA", "frame-ancestors"),
        ("CSP-SCRIPT", "script-src"),
        ("CSP-IMG", "img-src"),
    ] {
        let values = vec![
            directive.to_string(),
            format!("{} 'none'", directive),
            format!("{} *", directive),
            format!("{} 'self'", directive),
            format!("{} {}", directive, origin_s),
            format!("{} {}", directive, home),
            format!("{} {}", directive, parent_childs),
            String::new(),
            format!("{}=*", directive),
            "default-src *".to_string(),
            format!("{} http:", directive),
            "null".to_string(),
            "*".to_string(),
        ];
        let joined = format!("{}, {}, {}", values[1], values[2], values[3]);
        let redirects = [values[1].clone(), values[2].clone()];
        corpora.push(single_header_corpus(
            label,
            "Content-Security-Policy",
            &values[1],
            &values[2],
            &values,
            Some(joined),
            [&redirects[0], &redirects[1]],
        ));
    }

    let csp = "Content-Security-Policy";
    let xfo = "X-Frame-Options";
    let deny_cf = header(csp, "frame-ancestors 'none'");
    let deny_x = header(xfo, "DENY");
    let allowall_cf = header(csp, "*");
    let allowall_x = header(xfo, "INVALID");
    let allowsome_cf = header(csp, &format!("frame-ancestors {}", parent_childs));
    let allowsome_x = header(xfo, "SAMEORIGIN");
    corpora.push(BasicCorpus {
        label: "CSPvsXFO".to_string(),
        debug: vec![
            vec![deny_cf.clone(), deny_x.clone()],
            vec![allowall_cf.clone(), allowall_x.clone()],
        ],
        basic: vec![
            vec![deny_cf.clone(), allowall_x],
            vec![deny_cf.clone(), allowsome_x.clone()],
            vec![allowall_cf.clone(), allowsome_x],
            vec![deny_x.clone(), allowall_cf],
            vec![deny_x.clone(), allowsome_cf],
        ],
        redirects: vec![vec![deny_cf], vec![deny_x]],
    });

    corpora.push(single_header_corpus(
        "CORP",
        "Cross-Origin-Resource-Policy",
        "same-origin",
        "cross-origin",
        &strings(&["unsafe-none", "same-origin", "same-site", "cross-origin", "", "null", "*"]),
        Some("unsafe-none, same-site, cross-origin".to_string()),
        ["same-origin", "same-site"],
    ));

    corpora.push(single_header_corpus(
        "COEP",
        "Cross-Origin-Embedder-Policy",
        "require-corp",
        "unsafe-none",
        &strings(&["unsafe-none", "require-corp", "credentialless", "cross-origin", "", "null", "*"]),
        Some("unsafe-none, credentialless, cross-origin".to_string()),
        ["require-corp", "credentialless"],
    ));

    corpora.push(single_header_corpus(
        "COOP",
        "Cross-Origin-Opener-Policy",
        "same-origin",
        "unsafe-none",
        &strings(&[
            "unsafe-none",
            "same-origin-allow-popups",
            "same-origin",
            "same-origin-plus-COEP",
            "",
            "null",
            "*",
        ]),
        Some("unsafe-none, same-origin, same-origin-plus-COEP".to_string()),
        ["same-origin-allow-popups", "same-origin"],
    ));

    let acao = "Access-Control-Allow-Origin";
    let acac = "Access-Control-Allow-Credentials";
    let acam = "Access-Control-Allow-Methods";
    let acah = "Access-Control-Allow-Headers";
    let aceh = "Access-Control-Expose-Headers";
    let test = header("Test", "Test");
    corpora.push(BasicCorpus {
        label: "CORS".to_string(),
        debug: vec![
            vec![header(acao, "null")],
            vec![
                header(acao, &origin_s),
                header(acac, "true"),
                header(acam, "TEST"),
                header(acah, "Test"),
                header(aceh, "Test"),
                test.clone(),
            ],
        ],
        basic: vec![
            vec![test.clone(), header(acao, &origin)],
            vec![test.clone(), header(acac, "true")],
            vec![test.clone(), header(acao, "*"), header(acac, "true")],
            vec![
                test,
                header(acao, &origin_s),
                header(acac, "true"),
                header(acam, "TEST"),
                header(acah, "Test"),
                header(aceh, "Test"),
            ],
        ],
        redirects: vec![vec![header(acao, &origin_s)], vec![header(acao, "*")]],
    });

    let hsts = [
        "max-age=20",
        "max-age=20; includeSubDomains",
        "includeSubDomains",
        "",
        "max-age=20; includeSubDomains; preload",
        "max-age=0",
        "max-age=-5",
    ];
    let mut corpus = single_header_corpus(
        "HSTS",
        "Strict-Transport-Security",
        hsts[0],
        hsts[1],
        &concat(&[&["*", "null"], &hsts]),
        Some(hsts.join(", ")),
        [hsts[0], hsts[1]],
    );
    corpus.basic.push(vec![header("Strict-Transport-Security", "abc, max-age=20")]);
    corpora.push(corpus);

    let oac = ["?1", "?0", "", "1", "0", "true", "false"];
    let mut corpus = single_header_corpus(
        "OAC",
        "origin-agent-cluster",
        "?1",
        "?0",
        &concat(&[&["*", "null"], &oac]),
        Some(oac.join(", ")),
        ["?1", "?0"],
    );
    corpus.basic.push(vec![header("origin-agent-cluster", "abc, ?1")]);
    corpora.push(corpus);

    let pp = "Permissions-Policy";
    let mut corpus = single_header_corpus(
        "PP",
        pp,
        "fullscreen=()",
        "fullscreen=(*)",
        &[
            "*".to_string(),
            "null".to_string(),
            "fullscreen=".to_string(),
            "fullscreen=*".to_string(),
            "fullscreen=()".to_string(),
            "fullscreen=(self)".to_string(),
            format!("fullscreen=({})", origin_s),
            format!("fullscreen=({})", parent_childs),
            format!("fullscreen=({})", self_childs),
            "fullscreen=(self none)".to_string(),
            "fullscreen=(self,none)".to_string(),
            "fullscreen=(src)".to_string(),
            format!("fullscreen=({})", home),
            format!("fullscreen=({})", home_p),
        ],
        None,
        ["fullscreen=()", "fullscreen=(*)"],
    );
    let fp = "Feature-Policy";
    corpus.basic.extend(
        [
            "fullscreen *".to_string(),
            "fullscreen 'none'".to_string(),
            "fullscreen 'self'".to_string(),
            "fullscreen 'src'".to_string(),
            format!("fullscreen {}", origin_s),
            format!("fullscreen {}", self_childs),
            format!("fullscreen {}", parent_childs),
        ]
        .iter()
        .map(|v| vec![header(fp, v)]),
    );
    corpora.push(corpus);

    let rp = [
        "no-referrer",
        "no-referrer-when-downgrade",
        "same-origin",
        "origin",
        "strict-origin",
        "origin-when-cross-origin",
        "strict-origin-when-cross-origin",
        "unsafe-url",
        "",
    ];
    let mut corpus = single_header_corpus(
        "RP",
        "Referrer-Policy",
        "no-referrer",
        "unsafe-url",
        &concat(&[&["*", "null"], &rp]),
        Some(rp[..8].join(", ")),
        ["no-referrer", "unsafe-url"],
    );
    corpus.basic.push(vec![header("Referrer-Policy", "abc, strict-origin")]);
    corpora.push(corpus);

    let tao = "Timing-Allow-Origin";
    let mut corpus = single_header_corpus(
        "TAO",
        tao,
        "null",
        "*",
        &[
            "*".to_string(),
            "null".to_string(),
            origin_s.clone(),
            origin,
            parent,
            home,
            origin_sp,
            site,
        ],
        None,
        ["*", "null"],
    );
    corpus.basic.push(vec![header(tao, "null"), header(tao, "*")]);
    corpus.basic.push(vec![header(tao, &origin_s), header(tao, "*")]);
    corpora.push(corpus);

    corpora
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(label: &str) -> HeaderFamily {
        builtin_families(&HostConfig::default())
            .into_iter()
            .find(|f| f.label == label)
            .unwrap()
    }

    #[test]
    fn test_family_labels() {
        let labels: Vec<String> = builtin_families(&HostConfig::default())
            .into_iter()
            .map(|f| f.label)
            .collect();
        for expected in [
            "XFO", "CSP-FA", "CORS-ACAO", "CORS-ACAC", "CORS-ACAM", "CORS-ACAH", "CORS-ACEH",
            "CORP", "COEP", "COOP", "CSP-SCRIPT", "CSP-IMG", "HSTS", "PP", "RP", "TAO", "XCTO",
        ] {
            assert!(labels.iter().any(|l| l == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_other_values_start_with_empty_and_invalid() {
        for family in builtin_families(&HostConfig::default()) {
            assert_eq!(family.other_values[0], "", "{}", family.label);
            assert_eq!(family.other_values[1], "INVALID", "{}", family.label);
            assert!(family.other_values.iter().all(|v| !v.contains(URL_REP)));
        }
    }

    #[test]
    fn test_url_values_expanded() {
        let xfo = family("XFO");
        assert_eq!(xfo.legacy_values, vec!["ALLOW-FROM https://sub.web-platform.test"]);
        assert!(xfo
            .other_values
            .contains(&"ALLOW-FROM=https://not-web-platform.test".to_string()));
    }

    #[test]
    fn test_cors_base_response_excludes_probed_header() {
        let acao = family("CORS-ACAO");
        assert_eq!(acao.base_resp.len(), 5);
        assert!(acao.base_resp.iter().all(|(n, _)| n != "access-control-allow-origin"));
        assert_eq!(acao.partial_values, vec!["https://sub.web-platform.test"]);

        let acam = family("CORS-ACAM");
        assert_eq!(acam.partial_values, vec!["TEST"]);
    }

    #[test]
    fn test_multi_family_uses_csp_values() {
        let families = builtin_families(&HostConfig::default());
        let multi = builtin_multi_families(&families);
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].headers[0].1, family("CSP-FA").all_values());
        assert_eq!(multi[0].headers[1].1.len(), 4);
    }

    #[test]
    fn test_basic_corpora_shape() {
        let hosts = HostConfig::default();
        let redirect = hosts.redirect_empty();
        let corpora = builtin_basic_corpora(&hosts);
        assert_eq!(corpora.len(), 14);

        for corpus in &corpora {
            let specs = corpus.specs(&redirect);
            let debug = specs.iter().filter(|s| s.resp_type == RespType::Debug).count();
            assert_eq!(debug, 2, "{}", corpus.label);
            for spec in specs.iter().filter(|s| s.status_code == 302) {
                assert_eq!(spec.headers.last(), Some(&redirect));
                assert_eq!(spec.resp_type, RespType::Basic);
            }
        }

        let xfo = corpora.iter().find(|c| c.label == "XFO").unwrap();
        assert!(xfo.basic.contains(&Vec::new()));
        assert!(xfo
            .basic
            .contains(&vec![header("x-frame-options", "DENY, INVALID, ALLOWALL")]));
    }
}
