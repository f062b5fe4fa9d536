//! Reference catalog inserted by `/api/init-data` on an empty store.

use crate::models::{Category, NewProduct};

fn product(name: &str, description: &str, price: f64, category: Category, images: &[&str]) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: description.to_string(),
        price,
        category,
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn initial_products() -> Vec<NewProduct> {
    vec![
        product(
            "حلق ذهبي لامع",
            "حلق أنيق من الستانلس ستيل المطلي بالذهب، تصميم فريد يناسب جميع المناسبات.",
            150.0,
            Category::Earrings,
            &[
                "https://picsum.photos/seed/p1img1/600/600",
                "https://picsum.photos/seed/p1img2/600/600",
            ],
        ),
        product(
            "خاتم فضي مرصع",
            "خاتم من الستانلس ستيل الفضي مع فص كريستال لامع، يضيف لمسة من الرقي.",
            220.0,
            Category::Rings,
            &["https://picsum.photos/seed/p2img1/600/600"],
        ),
        product(
            "قلادة الفراشة الذهبية",
            "قلادة رقيقة بتصميم فراشة من الستانلس ستيل الذهبي، مثالية للإطلالات اليومية.",
            180.0,
            Category::Necklaces,
            &[
                "https://picsum.photos/seed/p3img1/600/600",
                "https://picsum.photos/seed/p3img2/600/600",
                "https://picsum.photos/seed/p3img3/600/600",
            ],
        ),
        product(
            "طقم حلق وخاتم بنفسجي",
            "طقم متناسق من حلق وخاتم ستانلس ستيل بلون بنفسجي غامق جذاب.",
            350.0,
            Category::Earrings,
            &["https://picsum.photos/seed/p4img1/600/600"],
        ),
        product(
            "قلادة القمر والنجوم",
            "قلادة ساحرة بتصميم القمر والنجوم، مصنوعة من الستانلس ستيل عالي الجودة.",
            200.0,
            Category::Necklaces,
            &["https://picsum.photos/seed/p5img1/600/600"],
        ),
        product(
            "خاتم رجالي أسود",
            "خاتم رجالي أنيق من الستانلس ستيل الأسود، تصميم عصري وقوي.",
            190.0,
            Category::Rings,
            &["https://picsum.photos/seed/p6img1/600/600"],
        ),
    ]
}
