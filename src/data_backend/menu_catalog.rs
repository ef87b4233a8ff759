//! Built-in reference menus, used when no menu source is reachable.

use crate::data_types::{Brand, Category, MenuItem, ModifierGroup, ModifierItem};

fn item(
    id: &str,
    name: &str,
    description: &str,
    price: f64,
    category: Category,
    calories: u32,
) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        image: Some(format!("/images/{}.jpg", id)),
        category,
        calories,
        is_new: false,
        is_popular: false,
        is_gluten_free: false,
    }
}

fn option(id: &str, name: &str, price: f64, max_quantity: u32) -> ModifierItem {
    ModifierItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        max_quantity,
    }
}

fn sushi_menu() -> Vec<MenuItem> {
    let mut menu = vec![
        item(
            "dragon-roll",
            "Dragon Roll",
            "Shrimp tempura, cucumber, avocado and eel sauce",
            18.0,
            Category::Rolls,
            510,
        ),
        item(
            "spicy-tuna-roll",
            "Spicy Tuna Roll",
            "Bluefin tuna, spicy mayo, scallion",
            14.5,
            Category::Rolls,
            390,
        ),
        item(
            "salmon-nigiri",
            "Salmon Nigiri",
            "Two pieces of king salmon over seasoned rice",
            9.0,
            Category::Nigiri,
            140,
        ),
        item(
            "chef-sashimi",
            "Chef's Sashimi",
            "Twelve pieces, chef's selection",
            32.0,
            Category::Sashimi,
            300,
        ),
        item(
            "edamame",
            "Edamame",
            "Steamed, sea salt",
            5.0,
            Category::Starters,
            120,
        ),
        item(
            "green-tea",
            "Iced Green Tea",
            "Unsweetened sencha",
            4.0,
            Category::Drinks,
            0,
        ),
    ];
    menu[0].is_popular = true;
    menu[3].is_new = true;
    menu[2].is_gluten_free = true;
    menu[4].is_gluten_free = true;
    menu
}

fn bakery_menu() -> Vec<MenuItem> {
    let mut menu = vec![
        item(
            "croissant",
            "Butter Croissant",
            "Laminated with Normandy butter",
            4.25,
            Category::Pastries,
            290,
        ),
        item(
            "pain-au-chocolat",
            "Pain au Chocolat",
            "Two batons of dark chocolate",
            4.75,
            Category::Pastries,
            330,
        ),
        item(
            "baguette",
            "Baguette Tradition",
            "Stone-baked, 24h fermentation",
            3.5,
            Category::Breads,
            690,
        ),
        item(
            "tarte-citron",
            "Tarte au Citron",
            "Lemon curd, torched meringue",
            7.0,
            Category::Cakes,
            410,
        ),
        item(
            "macarons",
            "Macaron Box",
            "Six assorted macarons",
            15.0,
            Category::Desserts,
            540,
        ),
    ];
    menu[0].is_popular = true;
    menu[4].is_new = true;
    menu[4].is_gluten_free = true;
    menu
}

pub fn menu_for(brand: Brand) -> Vec<MenuItem> {
    match brand {
        Brand::Sushi => sushi_menu(),
        Brand::Bakery => bakery_menu(),
    }
}

pub fn find_menu_item(brand: Brand, product_id: &str) -> Option<MenuItem> {
    menu_for(brand).into_iter().find(|i| i.id == product_id)
}

pub fn modifier_groups_for(brand: Brand, product_id: &str) -> Vec<ModifierGroup> {
    match (brand, product_id) {
        (Brand::Sushi, "dragon-roll" | "spicy-tuna-roll") => vec![
            ModifierGroup {
                id: "rice".to_string(),
                name: "Rice".to_string(),
                required: true,
                quantity: 1,
                options: vec![
                    option("white-rice", "White rice", 0.0, 1),
                    option("brown-rice", "Brown rice", 1.0, 1),
                    option("soy-paper", "Soy paper, no rice", 2.0, 1),
                ],
            },
            ModifierGroup {
                id: "extras".to_string(),
                name: "Extras".to_string(),
                required: false,
                quantity: 3,
                options: vec![
                    option("extra-avocado", "Avocado", 1.5, 2),
                    option("masago", "Masago", 2.0, 1),
                    option("spicy-mayo", "Spicy mayo", 0.5, 3),
                    option("tempura-flakes", "Tempura flakes", 0.5, 1),
                ],
            },
        ],
        (Brand::Bakery, "macarons") => vec![ModifierGroup {
            id: "flavours".to_string(),
            name: "Flavours".to_string(),
            required: true,
            quantity: 6,
            options: vec![
                option("pistachio", "Pistachio", 0.0, 6),
                option("raspberry", "Raspberry", 0.0, 6),
                option("salted-caramel", "Salted caramel", 0.0, 6),
                option("rose", "Rose", 0.5, 6),
            ],
        }],
        _ => Vec::new(),
    }
}
