use crate::models::domain::{Question, UserProfile};
