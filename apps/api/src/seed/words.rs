// Fixture vocabularies and small sampling helpers shared by the generators.

use rand::{distr::Alphanumeric, Rng};

pub const JOB_TITLES: &[&str] = &[
    "Frontend Developer",
    "Backend Developer",
    "Full Stack Developer",
    "UI/UX Designer",
    "Product Manager",
    "Data Scientist",
    "DevOps Engineer",
    "Mobile Developer",
    "QA Engineer",
    "Project Manager",
    "Business Analyst",
    "Marketing Manager",
];

pub const TECH_TAGS: &[&str] = &[
    "React",
    "Vue",
    "Angular",
    "Node.js",
    "Python",
    "Java",
    "TypeScript",
    "JavaScript",
    "AWS",
    "Docker",
    "Kubernetes",
    "MongoDB",
    "PostgreSQL",
    "Redis",
    "GraphQL",
    "REST API",
];

pub const SKILLS: &[&str] = &[
    "React",
    "Vue",
    "Angular",
    "Node.js",
    "Python",
    "Java",
    "TypeScript",
    "JavaScript",
    "AWS",
    "Docker",
    "Kubernetes",
    "MongoDB",
    "PostgreSQL",
    "Redis",
    "GraphQL",
    "REST API",
    "C++",
    "C#",
    "PHP",
    "Ruby",
    "Go",
    "Rust",
    "Swift",
    "Kotlin",
    "Machine Learning",
    "Data Science",
    "DevOps",
    "Frontend",
    "Backend",
];

pub const CITIES: &[&str] = &[
    "Bengaluru, Karnataka",
    "Hyderabad, Telangana",
    "Pune, Maharashtra",
    "Mumbai, Maharashtra",
    "Gurugram, Haryana",
    "Noida, Uttar Pradesh",
    "Chennai, Tamil Nadu",
    "New Delhi, Delhi",
    "Kochi, Kerala",
    "Ahmedabad, Gujarat",
];

pub const COMPANIES: &[&str] = &[
    "Arcadia Labs",
    "Bluepeak Systems",
    "Cobalt Finance",
    "Driftwood Health",
    "Evergreen Logistics",
    "Finch Analytics",
    "Granite Retail",
];

pub const EDUCATION: &[&str] = &[
    "Bachelor's in Computer Science",
    "Master's in Software Engineering",
    "Bachelor's in Information Technology",
    "Associate's in Computer Programming",
    "Bachelor's in Engineering",
    "Master's in Computer Science",
    "Bachelor's in Mathematics",
    "PhD in Computer Science",
];

pub const FIRST_NAMES: &[&str] = &[
    "Aarav", "Aditi", "Ananya", "Arjun", "Diya", "Ishaan", "Kabir", "Kavya", "Meera", "Neha",
    "Nikhil", "Priya", "Rahul", "Riya", "Rohan", "Saanvi", "Sameer", "Sneha", "Tanvi", "Vikram",
    "Yash", "Zoya", "Farhan", "Lakshmi",
];

pub const LAST_NAMES: &[&str] = &[
    "Agarwal", "Bose", "Chopra", "Desai", "Iyer", "Joshi", "Kapoor", "Khan", "Menon", "Mehta",
    "Nair", "Patel", "Pillai", "Rao", "Reddy", "Sharma", "Singh", "Thomas", "Verma", "Yadav",
];

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "voluptate",
];

/// Uniformly picks one item. `items` must not be empty.
pub fn pick<'a, R: Rng, T>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Picks between `min` and `max` distinct items, keeping their list order.
pub fn pick_many<R: Rng>(rng: &mut R, items: &[&str], min: usize, max: usize) -> Vec<String> {
    let wanted = rng.random_range(min..=max).min(items.len());
    let mut indices: Vec<usize> = (0..items.len()).collect();
    for i in 0..wanted {
        let j = rng.random_range(i..indices.len());
        indices.swap(i, j);
    }
    let mut chosen = indices[..wanted].to_vec();
    chosen.sort_unstable();
    chosen.into_iter().map(|i| items[i].to_string()).collect()
}

pub fn alphanumeric<R: Rng>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

pub fn sentence<R: Rng>(rng: &mut R) -> String {
    let len = rng.random_range(6..=12);
    let words: Vec<&str> = (0..len).map(|_| *pick(rng, LOREM)).collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

pub fn paragraph<R: Rng>(rng: &mut R) -> String {
    let len = rng.random_range(3..=5);
    (0..len).map(|_| sentence(rng)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_pick_many_respects_bounds_and_is_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let tags = pick_many(&mut rng, TECH_TAGS, 2, 5);
            assert!((2..=5).contains(&tags.len()));
            let mut dedup = tags.clone();
            dedup.dedup();
            assert_eq!(dedup.len(), tags.len());
        }
    }

    #[test]
    fn test_sentence_is_capitalised_and_terminated() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = sentence(&mut rng);
        assert!(s.ends_with('.'));
        assert!(s.chars().next().is_some_and(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_alphanumeric_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let suffix = alphanumeric(&mut rng, 4);
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
