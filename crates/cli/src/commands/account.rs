//! Account commands.

use std::path::PathBuf;

use secrecy::SecretString;
use verdant_storefront::Storefront;
use verdant_storefront::gateway::{ProfileImage, RegisterOutcome, RegistrationForm};

/// Arguments for `verdant register`.
pub struct RegisterArgs {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub phone: String,
    pub image: Option<PathBuf>,
}

/// Sign in.
///
/// # Errors
///
/// Returns an error if the credentials are rejected.
pub async fn login(
    storefront: &Storefront,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if storefront.gateway().login(email, password).await? {
        println!("Signed in as {email}.");
    } else {
        println!("Login accepted, but no token was returned.");
    }
    Ok(())
}

/// Create an account.
///
/// # Errors
///
/// Returns an error if the image cannot be read or the API rejects the form.
pub async fn register(
    storefront: &Storefront,
    args: RegisterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let profile_image = match args.image {
        Some(path) => {
            let bytes = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map_or_else(|| "profile".to_string(), |n| n.to_string_lossy().into_owned());
            Some(ProfileImage { file_name, bytes })
        }
        None => None,
    };

    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        password: SecretString::from(args.password),
        address: args.address,
        phone: args.phone,
        profile_image,
    };

    match storefront.gateway().register(form).await? {
        RegisterOutcome::SignedIn => println!("Account created. You are signed in."),
        RegisterOutcome::Registered => println!("Account created. Please log in."),
    }
    Ok(())
}

/// Sign out.
pub fn logout(storefront: &Storefront) {
    storefront.gateway().logout();
    println!("Signed out.");
}

/// Show the signed-in profile.
///
/// # Errors
///
/// Returns an error if signed out, the session expired, or the request fails.
pub async fn profile(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let profile = storefront.gateway().profile().await?;
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("Name:    {}", field(profile.name.as_deref()));
    println!("Email:   {}", field(profile.email.as_deref()));
    println!("Phone:   {}", field(profile.phone.as_deref()));
    println!("Address: {}", field(profile.address.as_deref()));
    if let Some(image) = &profile.profile_image {
        println!("Image:   {image}");
    }
    Ok(())
}
