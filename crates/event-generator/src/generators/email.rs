//! Company-style email address generator.
//!
//! Produces ASCII addresses shaped like `{user}@{company}.{tld}`, where the
//! user part is one of a few common corporate layouts (`jsmith`,
//! `john.smith`, `smithjohn`, ...).

use rand::seq::IndexedRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "james", "mary", "john", "patricia", "robert", "jennifer", "michael", "linda", "david",
    "elizabeth", "william", "barbara", "richard", "susan", "joseph", "jessica", "thomas", "sarah",
    "charles", "karen", "daniel", "nancy", "matthew", "lisa", "anthony", "betty", "mark", "sandra",
];

const LAST_NAMES: &[&str] = &[
    "smith", "johnson", "williams", "brown", "jones", "garcia", "miller", "davis", "rodriguez",
    "martinez", "hernandez", "lopez", "wilson", "anderson", "thomas", "taylor", "moore", "jackson",
    "martin", "lee", "thompson", "white", "harris", "clark", "lewis", "walker", "young", "allen",
];

const COMPANY_SUFFIXES: &[&str] = &["group", "inc", "llc", "partners", "and-sons", "ltd"];

const TLDS: &[&str] = &["com", "net", "org", "biz", "info"];

fn pick<'a, R: Rng>(rng: &mut R, words: &'a [&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or("example")
}

/// Generate an email address at a company-looking domain.
pub fn generate_company_email<R: Rng>(rng: &mut R) -> String {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);

    let user = match rng.random_range(0..4) {
        0 => format!("{}{last}", &first[..1]),
        1 => format!("{first}.{last}"),
        2 => format!("{last}{first}"),
        _ => format!("{first}{}", rng.random_range(1..100)),
    };

    let company = match rng.random_range(0..3) {
        0 => format!("{}-{}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES)),
        1 => format!("{}-{}", pick(rng, LAST_NAMES), pick(rng, LAST_NAMES)),
        _ => pick(rng, LAST_NAMES).to_string(),
    };

    format!("{user}@{company}.{}", pick(rng, TLDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_company_email_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let email = generate_company_email(&mut rng);
            assert!(email.is_ascii(), "{email}");

            let (user, domain) = email.split_once('@').expect("missing @");
            assert!(!user.is_empty());
            assert!(!domain.contains('@'));

            let (company, tld) = domain.rsplit_once('.').expect("missing tld");
            assert!(!company.is_empty());
            assert!(TLDS.contains(&tld));
        }
    }

    #[test]
    fn test_company_email_deterministic() {
        let mut rng1 = StdRng::seed_from_u64(9);
        let mut rng2 = StdRng::seed_from_u64(9);
        assert_eq!(
            generate_company_email(&mut rng1),
            generate_company_email(&mut rng2)
        );
    }
}
