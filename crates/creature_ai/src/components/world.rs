//! World компоненты: конструкции (стены) с секциями

use bevy::prelude::*;

/// Секция стены (самостоятельно повреждаемый участок)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSection {
    /// World position центра секции
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
}

impl WallSection {
    pub fn new(position: Vec2, max_health: f32) -> Self {
        Self {
            position,
            health: max_health,
            max_health,
        }
    }

    /// Пробита насквозь (тело секции отключено)
    pub fn is_breached(&self) -> bool {
        self.health <= 0.0
    }

    pub fn damage(&self) -> f32 {
        self.max_health - self.health
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }
}

/// Конструкция, перекрывающая линию видимости
///
/// Headless геометрия: круг `radius` вокруг Transform. Секции упорядочены
/// вдоль стены, соседние индексы = соседние участки.
#[derive(Component, Debug, Clone)]
pub struct Structure {
    pub radius: f32,
    pub sections: Vec<WallSection>,
}

impl Structure {
    /// Стена из `count` секций вдоль отрезка `from → to`
    pub fn wall(radius: f32, from: Vec2, to: Vec2, count: usize, section_health: f32) -> Self {
        let sections = (0..count)
            .map(|i| {
                let t = (i as f32 + 0.5) / count.max(1) as f32;
                WallSection::new(from.lerp(to, t), section_health)
            })
            .collect();

        Self { radius, sections }
    }

    /// Индекс секции, ближайшей к точке
    pub fn nearest_section(&self, point: Vec2) -> Option<usize> {
        nearest_section(&self.sections, point)
    }

    /// Точка внутри тела конструкции с центром `center`, вне пролома
    ///
    /// Пролом: ближайшая к точке секция пробита. Конструкция без секций глухая.
    pub fn is_solid_at(&self, center: Vec2, point: Vec2) -> bool {
        if center.distance(point) > self.radius {
            return false;
        }
        self.nearest_section(point)
            .map_or(true, |index| !self.sections[index].is_breached())
    }

    /// Урон секции, ближайшей к точке удара
    pub fn damage_near(&mut self, point: Vec2, amount: f32) -> Option<usize> {
        let index = self.nearest_section(point)?;
        self.sections[index].take_damage(amount);
        Some(index)
    }
}

/// Индекс секции, ближайшей к точке (`None` для пустого списка)
pub fn nearest_section(sections: &[WallSection], point: Vec2) -> Option<usize> {
    sections
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.position
                .distance_squared(point)
                .total_cmp(&b.position.distance_squared(point))
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_sections_evenly_spaced() {
        let wall = Structure::wall(1.0, Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0), 4, 50.0);
        assert_eq!(wall.sections.len(), 4);
        assert_eq!(wall.sections[0].position, Vec2::new(0.0, -1.5));
        assert_eq!(wall.sections[3].position, Vec2::new(0.0, 1.5));
    }

    #[test]
    fn test_nearest_section() {
        let wall = Structure::wall(1.0, Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0), 4, 50.0);
        assert_eq!(wall.nearest_section(Vec2::new(0.2, 0.6)), Some(2));
        assert_eq!(Structure { radius: 1.0, sections: vec![] }.nearest_section(Vec2::ZERO), None);
    }

    #[test]
    fn test_section_breach() {
        let mut section = WallSection::new(Vec2::ZERO, 20.0);
        section.health = 5.0;
        assert_eq!(section.damage(), 15.0);
        assert!(!section.is_breached());

        section.health = 0.0;
        assert!(section.is_breached());
    }

    #[test]
    fn test_solid_body_except_breach() {
        let mut wall = Structure::wall(1.0, Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0), 4, 50.0);
        let center = Vec2::ZERO;

        assert!(wall.is_solid_at(center, Vec2::new(-0.9, -0.4)));
        assert!(wall.is_solid_at(center, Vec2::new(-1.0, 0.0)));
        assert!(!wall.is_solid_at(center, Vec2::new(-1.1, 0.0)));

        wall.sections[1].health = 0.0;
        assert!(!wall.is_solid_at(center, Vec2::new(-0.9, -0.4)));
        assert!(wall.is_solid_at(center, Vec2::new(-0.9, 0.4)));

        let blank = Structure { radius: 1.0, sections: vec![] };
        assert!(blank.is_solid_at(center, Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn test_damage_near_hits_closest_section() {
        let mut wall = Structure::wall(1.0, Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0), 4, 50.0);

        assert_eq!(wall.damage_near(Vec2::new(0.0, -1.4), 80.0), Some(0));
        assert_eq!(wall.sections[0].health, 0.0);
        assert!(wall.sections[0].is_breached());
        assert_eq!(wall.sections[1].health, 50.0);
    }
}
