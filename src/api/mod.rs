pub mod curseforge;
