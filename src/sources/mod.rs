pub mod openerapi;
pub mod restcountries;
