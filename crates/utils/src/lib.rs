pub mod email;

pub use email::{LogMailer, MailError, Mailer, SmtpMailer, dispatch_confirmation};
