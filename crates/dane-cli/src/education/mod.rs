//! Educational features: explanations of what each mode does.

use colored::Colorize;

/// Command explanation builder.
pub struct Explain {
    description: String,
    query: Option<String>,
    cost: Option<String>,
    what_happens: Vec<String>,
    learn_more: Option<String>,
}

impl Explain {
    fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            query: None,
            cost: None,
            what_happens: Vec::new(),
            learn_more: None,
        }
    }

    fn query_name(mut self, name: &str) -> Self {
        self.query = Some(name.to_string());
        self
    }

    fn cost(mut self, cost: &str) -> Self {
        self.cost = Some(cost.to_string());
        self
    }

    fn step(mut self, step: &str) -> Self {
        self.what_happens.push(step.to_string());
        self
    }

    fn rfc(mut self, section: &str) -> Self {
        self.learn_more = Some(format!("https://datatracker.ietf.org/doc/html/rfc6698#{section}"));
        self
    }

    /// Print the explanation to stdout.
    pub fn print(&self) {
        println!();
        println!("{}", "=== What This Does ===".bold().cyan());
        println!("{}", self.description);
        println!();

        if !self.what_happens.is_empty() {
            println!("{}", "How it works:".bold());
            for (i, step) in self.what_happens.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
            println!();
        }

        if let Some(query) = &self.query {
            println!("{} {}", "DNS Query:".bold(), query.dimmed());
        }

        if let Some(cost) = &self.cost {
            println!("{} {}", "Network Cost:".bold(), cost);
        }

        if let Some(url) = &self.learn_more {
            println!();
            println!("{} {}", "Learn more:".bold(), url.cyan().underline());
        }

        println!();
        println!("{}", "=== Results ===".bold().cyan());
        println!();
    }

    // ========================================================================
    // Factory methods for each command
    // ========================================================================

    pub fn validate(query_name: &str, domain: &str, port: &str) -> Self {
        Self::new(&format!(
            "Checks whether the certificate {domain}:{port} presents is the one its TLSA record publishes."
        ))
        .query_name(&format!("{query_name} IN TLSA"))
        .cost("1 DNS query and 1 TLS handshake")
        .step("Asks the resolver for the service's TLSA record")
        .step("Connects with TLS and records the certificate chain the server sends")
        .step("Hashes each certificate (or its public key) as the record's selector and matching type say")
        .step("Prints success!!! only if the chain matches the published data")
        .rfc("section-2.1")
    }

    pub fn scan(domains: usize, resolver: &str, rate: u32, burst: u32) -> Self {
        Self::new(&format!(
            "Measures TLSA adoption by asking {resolver} for the TLSA record of {domains} domains."
        ))
        .query_name("_<port>._<transport>.<domain>. IN TLSA, one per domain")
        .cost(&format!("{domains} DNS queries at up to {rate}/s (burst {burst})"))
        .step("Sends all queries over one UDP socket, each tagged with its list position as id")
        .step("Matches every answer to its domain by that id, whatever order answers arrive in")
        .step("Prints YES when the answer holds a TLSA record and NO otherwise")
        .step("Stops once every query is answered or the resolver goes quiet")
        .rfc("section-2")
    }

    pub fn query(query_name: &str) -> Self {
        Self::new("Prints the TLSA records published for a service.")
            .query_name(&format!("{query_name} IN TLSA"))
            .cost("1 DNS query")
            .step("usage: 0 PKIX-TA, 1 PKIX-EE, 2 DANE-TA, 3 DANE-EE")
            .step("selector: 0 full certificate, 1 public key only")
            .step("matching type: 0 exact, 1 SHA-256, 2 SHA-512")
            .rfc("section-2.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories() {
        let explain = Explain::validate("_443._tcp.example.com.", "example.com", "443");
        assert_eq!(explain.what_happens.len(), 4);
        assert_eq!(explain.query.as_deref(), Some("_443._tcp.example.com. IN TLSA"));
        assert!(explain.learn_more.unwrap().ends_with("#section-2.1"));

        let explain = Explain::scan(1000, "8.8.8.8:53", 200, 50);
        assert!(explain.cost.unwrap().contains("200/s"));
    }
}
