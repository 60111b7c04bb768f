//! Response generation strategies for the parsing corpus

use super::family::{HeaderFamily, MultiHeaderFamily};
use super::mutation::{basic_mutations, general_mutations, mutate_header_name, mutate_header_value};
use headerprobe_common::{Header, ResponseSpec};
use itertools::Itertools;
use tracing::warn;

/// Status codes each valid value is additionally served with
pub const STATUS_CODES: [u16; 10] = [201, 203, 204, 300, 302, 400, 403, 404, 418, 500];

/// Invalid values used by the mixed valid/invalid sweep
const INVALID_SWEEP: usize = 2;

fn pair(name: &str, value: &str) -> Header {
    (name.to_string(), value.to_string())
}

impl HeaderFamily {
    fn response(&self, mut headers: Vec<Header>) -> ResponseSpec {
        headers.extend(self.base_resp.iter().cloned());
        ResponseSpec::new(headers, &self.label)
    }

    fn single(&self, value: &str) -> ResponseSpec {
        self.response(vec![pair(&self.header_name, value)])
    }

    /// Valid values under the canonical, alternative and mutated names
    pub fn header_name_tests(&self) -> Vec<ResponseSpec> {
        let mutated_names = mutate_header_name(&self.header_name);
        let mut out = Vec::new();
        for value in self.valid_values() {
            out.push(self.single(&value));
            for name in &self.alt_names {
                out.push(self.response(vec![pair(name, &value)]));
            }
            for name in &mutated_names {
                out.push(self.response(vec![pair(name, &value)]));
            }
        }
        out
    }

    /// Legacy and other values as-is, valid values under other status codes
    /// and under every value mutation
    pub fn parsing_tests(&self, redirect: &Header) -> Vec<ResponseSpec> {
        let mut out = Vec::new();
        for value in self.legacy_values.iter().chain(&self.other_values) {
            out.push(self.single(value));
        }

        let ops = general_mutations();
        for value in self.valid_values() {
            for code in STATUS_CODES {
                let mut headers = vec![pair(&self.header_name, &value)];
                if (300..400).contains(&code) {
                    headers.push(redirect.clone());
                }
                out.push(self.response(headers).with_status(code));
            }
            for mutated in mutate_header_value(&value, &ops) {
                out.push(self.single(&mutated));
            }
        }
        out
    }

    /// Several values in one response: joined, duplicated, mixed-case names,
    /// and valid values next to invalid ones
    pub fn mult_header_tests(&self) -> Vec<ResponseSpec> {
        let name = &self.header_name;
        let valid = self.valid_values();
        let orders: Vec<Vec<&String>> = valid.iter().permutations(valid.len()).collect();
        let mut out = Vec::new();

        for order in &orders {
            for sep in [", ", "; ", " "] {
                out.push(self.single(&order.iter().join(sep)));
            }
        }

        for order in &orders {
            out.push(self.response(order.iter().map(|v| pair(name, v)).collect()));
        }

        for order in orders.iter().filter(|o| o.len() >= 3) {
            let first_rest = order[1..].iter().join(", ");
            let rest_last = order[..order.len() - 1].iter().join(", ");
            out.push(self.response(vec![pair(name, order[0]), pair(name, &first_rest)]));
            out.push(self.response(vec![
                pair(name, &rest_last),
                pair(name, order[order.len() - 1]),
            ]));
        }

        for value in &valid {
            out.push(self.response(vec![pair(name, value), pair(name, value)]));
            out.push(self.single(&format!("{}, {}", value, value)));
            out.push(self.response(vec![pair(name, value), pair(name, &value.to_lowercase())]));
            out.push(self.response(vec![pair(name, value), pair(name, &value.to_uppercase())]));
        }

        let upper = name.to_uppercase();
        for order in &orders {
            for (first_name, rest_name) in [(name, &upper), (&upper, name)] {
                let headers = order
                    .iter()
                    .enumerate()
                    .map(|(i, v)| pair(if i == 0 { first_name } else { rest_name }, v))
                    .collect();
                out.push(self.response(headers));
            }
        }

        for valid_value in &valid {
            for invalid in self.other_values.iter().take(INVALID_SWEEP) {
                out.push(self.response(vec![pair(name, valid_value), pair(name, invalid)]));
                out.push(self.response(vec![pair(name, invalid), pair(name, valid_value)]));
                out.push(self.single(&format!("{}, {}", valid_value, invalid)));
                out.push(self.single(&format!("{}, {}", invalid, valid_value)));
            }
        }

        out
    }

    /// Every strategy, in generation order
    pub fn all_tests(&self, redirect: &Header) -> Vec<ResponseSpec> {
        let mut out = self.header_name_tests();
        out.extend(self.parsing_tests(redirect));
        out.extend(self.mult_header_tests());
        out
    }
}

impl MultiHeaderFamily {
    /// Every header order over basic-mutated names, cycling through values.
    ///
    /// Values are not fully combined: for index `i` each header takes its
    /// `i % len`-th value, up to the longest value list.
    pub fn all_tests(&self) -> Vec<ResponseSpec> {
        if let Some((name, _)) = self.headers.iter().find(|(_, values)| values.is_empty()) {
            warn!("Multi-header family {} has no values for {}, skipping", self.label, name);
            return Vec::new();
        }

        let ops = basic_mutations();
        let mutated: Vec<Vec<String>> = self
            .headers
            .iter()
            .map(|(name, _)| mutate_header_value(name, &ops).into_iter().collect())
            .collect();
        let rounds = self.headers.iter().map(|(_, v)| v.len()).max().unwrap_or(0);

        let mut out = Vec::new();
        for order in (0..self.headers.len()).permutations(self.headers.len()) {
            let combos = order
                .iter()
                .map(|&n| mutated[n].iter().map(move |name| (n, name)))
                .multi_cartesian_product();
            for combo in combos {
                for i in 0..rounds {
                    let mut headers: Vec<Header> = combo
                        .iter()
                        .map(|&(n, name)| {
                            let values = &self.headers[n].1;
                            (name.clone(), values[i % values.len()].clone())
                        })
                        .collect();
                    headers.extend(self.base_resp.iter().cloned());
                    out.push(ResponseSpec::new(headers, &self.label));
                }
            }
        }
        out
    }
}
