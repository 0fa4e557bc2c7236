pub mod contact;
pub mod token;
pub mod user;

pub use contact::{
    BirthdayQuery, Contact, ContactInput, ContactListQuery, ContactResponse, ContactSearchQuery,
};
pub use token::TokenScope;
pub use user::{
    LoginInput, MessageResponse, RequestEmailInput, SignupInput, SignupResponse, TokenPair, User,
    UserProfile,
};
