//! Sample data for the demonstration suites.
//!
//! A real project would pull these from a database, external files or a
//! generator; static tables keep the harness self-contained. Accessors
//! rebuild their values on every call, so nothing here outlives the test
//! that asked for it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    User,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: &'static str,
    pub password: &'static str,
    pub role_label: &'static str,
}

pub fn credentials(role: Role) -> Credentials {
    match role {
        Role::Admin => Credentials {
            username: "admin@example.com",
            password: "admin123",
            role_label: "Administrator",
        },
        Role::Manager => Credentials {
            username: "manager@example.com",
            password: "manager123",
            role_label: "Manager",
        },
        Role::User => Credentials {
            username: "user@example.com",
            password: "user123",
            role_label: "Standard User",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationScenario {
    Valid,
    MissingRequiredFields,
    InvalidEmail,
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub confirm_password: &'static str,
    pub phone: &'static str,
    pub country: &'static str,
    pub agree_terms: bool,
}

pub fn registration_form(scenario: RegistrationScenario) -> RegistrationForm {
    let valid = RegistrationForm {
        first_name: "John",
        last_name: "Doe",
        email: "john.doe@example.com",
        password: "P@ssw0rd123",
        confirm_password: "P@ssw0rd123",
        phone: "1234567890",
        country: "United States",
        agree_terms: true,
    };
    match scenario {
        RegistrationScenario::Valid => valid,
        RegistrationScenario::MissingRequiredFields => RegistrationForm {
            first_name: "",
            email: "",
            ..valid
        },
        RegistrationScenario::InvalidEmail => RegistrationForm {
            email: "not-an-email",
            ..valid
        },
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    pub price: f64,
    pub description: &'static str,
    pub category: &'static str,
    pub in_stock: bool,
}

pub fn products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            name: "Laptop",
            price: 999.99,
            description: "High-performance laptop with 16GB RAM and 512GB SSD",
            category: "Electronics",
            in_stock: true,
        },
        Product {
            id: 2,
            name: "Smartphone",
            price: 699.99,
            description: "Latest smartphone with 128GB storage and dual camera",
            category: "Electronics",
            in_stock: true,
        },
        Product {
            id: 3,
            name: "Headphones",
            price: 199.99,
            description: "Noise-cancelling wireless headphones",
            category: "Accessories",
            in_stock: false,
        },
    ]
}

pub fn product_by_id(id: u32) -> Option<Product> {
    products().into_iter().find(|p| p.id == id)
}

pub fn search_queries_with_results() -> Vec<&'static str> {
    vec!["laptop", "phone", "electronics"]
}

pub fn search_queries_without_results() -> Vec<&'static str> {
    vec!["xylophone", "zzzzzz", "12345xyz"]
}

pub fn search_queries_special_characters() -> Vec<&'static str> {
    vec!["laptop$", "***", "><script>"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_roles_are_distinct() {
        let admin = credentials(Role::Admin);
        let user = credentials(Role::User);
        assert_ne!(admin.username, user.username);
        assert_eq!(admin.role_label, "Administrator");
    }

    #[test]
    fn invalid_email_scenario_only_touches_the_email() {
        let valid = registration_form(RegistrationScenario::Valid);
        let invalid = registration_form(RegistrationScenario::InvalidEmail);
        assert_eq!(invalid.first_name, valid.first_name);
        assert_eq!(invalid.email, "not-an-email");
    }

    #[test]
    fn product_lookup_by_id() {
        assert_eq!(product_by_id(2).unwrap().name, "Smartphone");
        assert!(product_by_id(99).is_none());
    }
}
