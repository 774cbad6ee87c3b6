pub mod srm;
pub mod ualberta;
pub mod umanitoba;
pub mod vit;
